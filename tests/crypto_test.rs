use clawrrency::crypto::{
    digest_value, sha256_hex, to_canonical_string, Keypair, PublicKey, Signer,
};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// SIGNATURE ROUND-TRIP
// ============================================================================

#[test]
fn test_sign_verify_roundtrip() {
    let kp = Keypair::generate();
    let sig = Signer::sign(&kp, b"hello shells");
    assert!(Signer::verify(&kp.public_key(), b"hello shells", &sig));
}

#[test]
fn test_other_key_never_verifies() {
    let kp = Keypair::generate();
    let other = Keypair::generate();
    let sig = Signer::sign(&kp, b"hello shells");
    assert!(!Signer::verify(&other.public_key(), b"hello shells", &sig));
}

proptest! {
    // verify(sign(m, sk), m, pk) holds for every message and keypair,
    // and fails under any other keypair.
    #[test]
    fn prop_signature_roundtrip(seed in any::<[u8; 32]>(), message in prop::collection::vec(any::<u8>(), 0..256)) {
        let kp = Keypair::from_secret_hex(&hex::encode(seed)).unwrap();
        let sig = Signer::sign(&kp, &message);
        prop_assert!(Signer::verify(&kp.public_key(), &message, &sig));

        let other = Keypair::generate();
        prop_assert!(!Signer::verify(&other.public_key(), &message, &sig));
    }

    // Canonical hashing is invariant under object key order.
    #[test]
    fn prop_canonical_hash_ignores_key_order(a in 0u64..1000, b in 0u64..1000, s in "[a-z]{0,12}") {
        let forward = json!({"amount": a, "nonce": b, "memo": s});
        let backward = json!({"memo": s, "nonce": b, "amount": a});
        prop_assert_eq!(digest_value(&forward), digest_value(&backward));
    }
}

// ============================================================================
// CANONICAL FORM
// ============================================================================

#[test]
fn test_canonical_form_is_compact_and_sorted() {
    let value = json!({
        "signature": "",
        "digest": "ab",
        "view": 0
    });
    assert_eq!(
        to_canonical_string(&value),
        r#"{"digest":"ab","signature":"","view":0}"#
    );
}

#[test]
fn test_nested_objects_sorted_too() {
    let value = json!({"z": {"b": 1, "a": 2}, "a": [ {"y": 1, "x": 2} ]});
    assert_eq!(
        to_canonical_string(&value),
        r#"{"a":[{"x":2,"y":1}],"z":{"a":2,"b":1}}"#
    );
}

#[test]
fn test_sha256_hex_known_vector() {
    // sha256("abc")
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

// ============================================================================
// KEY VALIDATION
// ============================================================================

#[test]
fn test_public_key_must_be_exactly_32_bytes() {
    assert!(PublicKey::from_hex(&"ab".repeat(31)).is_err());
    assert!(PublicKey::from_hex(&"ab".repeat(33)).is_err());
    assert!(PublicKey::from_hex("not-hex").is_err());
}

#[test]
fn test_generated_keys_parse_back() {
    let kp = Keypair::generate();
    let parsed = PublicKey::from_hex(&kp.public_key_hex()).unwrap();
    assert_eq!(parsed, kp.public_key());
}
