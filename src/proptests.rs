//! Property-based tests for canonicalization, signing and sealing.

use proptest::prelude::*;
use serde_json::{Map, Value as JsonValue};

use crate::cipher::{open, seal};
use crate::keys::PrivateKeyBundle;
use crate::signing::{canonicalize, ContentHash};
use crate::types::TrustError;

use ed25519_dalek::{Signer, Verifier};

fn json_leaf() -> impl Strategy<Value = JsonValue> {
    prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::Bool),
        any::<i64>().prop_map(JsonValue::from),
        ".{0,12}".prop_map(JsonValue::String),
    ]
}

fn json_value() -> impl Strategy<Value = JsonValue> {
    json_leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(JsonValue::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|entries| JsonValue::Object(entries.into_iter().collect())),
        ]
    })
}

/// Rebuild every object with its keys inserted in reverse order.
fn reverse_insertion(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(reverse_insertion).collect()),
        JsonValue::Object(map) => {
            let mut reversed = Map::new();
            for (key, item) in map.iter().rev() {
                reversed.insert(key.clone(), reverse_insertion(item));
            }
            JsonValue::Object(reversed)
        }
        other => other.clone(),
    }
}

// ==================== Canonicalization ====================

proptest! {
    /// Canonical bytes are valid JSON that parses back to the same value.
    #[test]
    fn canonical_form_parses_back(value in json_value()) {
        let canonical = canonicalize(&value).unwrap();
        let parsed: JsonValue = serde_json::from_slice(&canonical).unwrap();
        prop_assert_eq!(parsed, value);
    }

    /// Key insertion order never changes the canonical bytes.
    #[test]
    fn canonical_form_ignores_key_order(value in json_value()) {
        prop_assert_eq!(
            canonicalize(&value).unwrap(),
            canonicalize(&reverse_insertion(&value)).unwrap()
        );
    }

    /// Canonicalization is idempotent.
    #[test]
    fn canonical_form_is_a_fixed_point(value in json_value()) {
        let once = canonicalize(&value).unwrap();
        let reparsed: JsonValue = serde_json::from_slice(&once).unwrap();
        prop_assert_eq!(once, canonicalize(&reparsed).unwrap());
    }

    /// Any non-integer number anywhere is rejected.
    #[test]
    fn fractional_numbers_rejected(whole in -1000i64..1000) {
        let value = serde_json::json!({ "amount": [whole, (whole as f64) + 0.5] });
        prop_assert!(matches!(canonicalize(&value), Err(TrustError::InvalidInput(_))));
    }
}

// ==================== Content Hash ====================

proptest! {
    /// Hashes always render as 64 lowercase hex characters and parse back.
    #[test]
    fn content_hash_shape(value in json_value()) {
        let hash = ContentHash::of_content(&value).unwrap();
        prop_assert_eq!(hash.as_str().len(), 64);
        prop_assert!(hash.as_str().bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
        prop_assert_eq!(ContentHash::parse(hash.as_str()).unwrap(), hash);
    }
}

// ==================== Signatures ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Signatures verify over the canonical bytes and fail after any byte flip.
    #[test]
    fn signature_soundness(value in json_value(), flip in any::<prop::sample::Index>()) {
        let key = PrivateKeyBundle::generate();
        let canonical = canonicalize(&value).unwrap();
        let signature = key.signing_key().sign(&canonical);
        let public = key.public_key();
        let verifying = public.verifying_key();
        prop_assert!(verifying.verify(&canonical, &signature).is_ok());

        let mut mutated = canonical.clone();
        let at = flip.index(mutated.len());
        mutated[at] ^= 0x01;
        prop_assert!(verifying.verify(&mutated, &signature).is_err());
    }
}

// ==================== Sealing ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Payloads within the limit open for the recipient and no one else.
    #[test]
    fn seal_open_for_recipient_only(payload in prop::collection::vec(any::<u8>(), 0..2048)) {
        let recipient = PrivateKeyBundle::generate();
        let stranger = PrivateKeyBundle::generate();
        let envelope = seal(&payload, &recipient.public_key(), 4096).unwrap();

        prop_assert_eq!(open(&envelope, &recipient).unwrap(), payload);
        prop_assert!(matches!(open(&envelope, &stranger), Err(TrustError::DecryptionFailed)));
    }

    /// Payloads above the limit are rejected, never truncated.
    #[test]
    fn seal_rejects_over_limit(extra in 1usize..64) {
        let recipient = PrivateKeyBundle::generate();
        let limit = 128;
        let payload = vec![0u8; limit + extra];
        let rejected = matches!(
            seal(&payload, &recipient.public_key(), limit),
            Err(TrustError::PayloadTooLarge { .. })
        );
        prop_assert!(rejected);
    }
}
