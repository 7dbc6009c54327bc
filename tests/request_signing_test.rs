//! Request Signing Integration Tests
//!
//! Canonicalization, sign/verify round trips, replay window and tamper
//! detection through the public signing API.

use chrono::{Duration, TimeZone, Utc};
use kagi_auth::signing::digest::{canonical_string, HashType, Params, SignatureMaterial};
use kagi_auth::signing::{self, Verification, MAX_ALLOWABLE_TIME_DELTA_MS};
use rand::distr::Alphanumeric;
use rand::Rng;

const SECRET: &str = "shh";
const FIXED_TIMESTAMP: i64 = 1_000_000_000;

const ALL_HASH_TYPES: [HashType; 5] = [
    HashType::Md5,
    HashType::HmacMd5,
    HashType::HmacSha1,
    HashType::HmacSha256,
    HashType::HmacSha512,
];

// ========================================================================
// Helpers
// ========================================================================

fn scenario_params() -> Params {
    let mut params = Params::new();
    params.insert("to".into(), "123".into());
    params.insert("from".into(), "456".into());
    params
}

fn random_string(rng: &mut impl Rng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn random_pairs(rng: &mut impl Rng) -> Vec<(String, String)> {
    let count = rng.random_range(1..12);
    (0..count)
        .map(|i| {
            let len = rng.random_range(1..16);
            (format!("p{i}_{}", random_string(rng, 4)), random_string(rng, len))
        })
        .collect()
}

// ========================================================================
// TEST: Fixed vector
// ========================================================================

#[test]
fn test_concrete_scenario_digest() {
    let mut params = scenario_params();
    signing::sign_at(&mut params, SECRET, HashType::Md5, FIXED_TIMESTAMP).unwrap();

    assert_eq!(params.get("timestamp").unwrap(), "1000000000");
    assert_eq!(
        params.get("signature").unwrap(),
        "bde6144f730bb5d5a2de3e12187c8d82"
    );
}

#[test]
fn test_concrete_scenario_canonical_form() {
    let mut params = scenario_params();
    params.insert("timestamp".into(), FIXED_TIMESTAMP.to_string());

    let material = SignatureMaterial::compute(&params, SECRET, HashType::Md5).unwrap();
    assert_eq!(
        material.canonical(),
        "&from=456&timestamp=1000000000&to=123"
    );
}

// ========================================================================
// TEST: Canonicalization determinism
// ========================================================================

#[test]
fn test_canonicalization_ignores_insertion_order() {
    let mut rng = rand::rng();

    for _ in 0..50 {
        let pairs = random_pairs(&mut rng);

        let forward: Params = pairs.iter().cloned().collect();
        let reversed: Params = pairs.iter().rev().cloned().collect();

        let first = canonical_string(&forward);
        assert_eq!(first, canonical_string(&reversed));
        assert_eq!(first, canonical_string(&forward));
    }
}

#[test]
fn test_separators_in_values_are_neutralised() {
    let mut split = Params::new();
    split.insert("a".into(), "1&b=2".into());

    let mut joined = Params::new();
    joined.insert("a".into(), "1".into());
    joined.insert("b".into(), "2".into());

    assert_eq!(canonical_string(&split), "&a=1_b_2");
    assert_ne!(canonical_string(&split), canonical_string(&joined));
}

// ========================================================================
// TEST: Sign / verify round trip
// ========================================================================

#[test]
fn test_round_trip_for_every_hash_type() {
    let mut rng = rand::rng();

    for hash_type in ALL_HASH_TYPES {
        let mut params: Params = random_pairs(&mut rng).into_iter().collect();
        signing::sign(&mut params, SECRET, hash_type).unwrap();
        assert!(
            signing::verify(&params, SECRET, hash_type),
            "{hash_type} round trip failed"
        );
    }
}

#[test]
fn test_round_trip_within_window() {
    let signed_at = Utc.timestamp_opt(FIXED_TIMESTAMP, 0).unwrap();
    let mut params = scenario_params();
    signing::sign_at(&mut params, SECRET, HashType::HmacSha256, FIXED_TIMESTAMP).unwrap();

    for offset_secs in [-300, -120, 0, 1, 299, 300] {
        let now = signed_at + Duration::seconds(offset_secs);
        assert!(
            signing::verify_at(&params, SECRET, HashType::HmacSha256, now),
            "offset {offset_secs}s should verify"
        );
    }
}

#[test]
fn test_wrong_secret_or_hash_type_rejected() {
    let now = Utc.timestamp_opt(FIXED_TIMESTAMP, 0).unwrap();
    let mut params = scenario_params();
    signing::sign_at(&mut params, SECRET, HashType::HmacSha1, FIXED_TIMESTAMP).unwrap();

    assert!(!signing::verify_at(&params, "other", HashType::HmacSha1, now));
    assert!(!signing::verify_at(&params, SECRET, HashType::HmacSha256, now));
}

// ========================================================================
// TEST: Replay window
// ========================================================================

#[test]
fn test_replay_window_edges() {
    assert_eq!(MAX_ALLOWABLE_TIME_DELTA_MS, 300_000);

    let signed_at = Utc.timestamp_opt(FIXED_TIMESTAMP, 0).unwrap();
    let mut params = scenario_params();
    signing::sign_at(&mut params, SECRET, HashType::Md5, FIXED_TIMESTAMP).unwrap();

    let late = signed_at + Duration::milliseconds(300_001);
    let early = signed_at - Duration::milliseconds(300_001);

    assert_eq!(
        signing::check_at(&params, SECRET, HashType::Md5, late),
        Verification::StaleTimestamp
    );
    assert_eq!(
        signing::check_at(&params, SECRET, HashType::Md5, early),
        Verification::StaleTimestamp
    );
    assert!(signing::verify_at(
        &params,
        SECRET,
        HashType::Md5,
        signed_at + Duration::milliseconds(300_000)
    ));
}

#[test]
fn test_far_future_timestamp_rejected() {
    let now = Utc.timestamp_opt(FIXED_TIMESTAMP, 0).unwrap();
    let mut params = scenario_params();
    signing::sign_at(&mut params, SECRET, HashType::Md5, FIXED_TIMESTAMP + 86_400).unwrap();

    assert!(!signing::verify_at(&params, SECRET, HashType::Md5, now));
}

// ========================================================================
// TEST: Tamper detection and malformed input
// ========================================================================

#[test]
fn test_tampered_values_rejected() {
    let now = Utc.timestamp_opt(FIXED_TIMESTAMP, 0).unwrap();
    let mut signed = scenario_params();
    signed.insert("text".into(), "hello".into());
    signing::sign_at(&mut signed, SECRET, HashType::HmacSha256, FIXED_TIMESTAMP).unwrap();

    for name in ["to", "from", "text"] {
        let mut tampered = signed.clone();
        tampered.insert(name.into(), "tampered".into());
        assert_eq!(
            signing::check_at(&tampered, SECRET, HashType::HmacSha256, now),
            Verification::Mismatch,
            "changing {name} should be detected"
        );
    }

    let mut added = signed.clone();
    added.insert("extra".into(), "1".into());
    assert!(!signing::verify_at(&added, SECRET, HashType::HmacSha256, now));
}

#[test]
fn test_missing_parts_rejected() {
    let now = Utc.timestamp_opt(FIXED_TIMESTAMP, 0).unwrap();
    let mut params = scenario_params();
    signing::sign_at(&mut params, SECRET, HashType::Md5, FIXED_TIMESTAMP).unwrap();

    let mut no_signature = params.clone();
    no_signature.remove("signature");
    assert_eq!(
        signing::check_at(&no_signature, SECRET, HashType::Md5, now),
        Verification::MissingSignature
    );

    let mut no_timestamp = params.clone();
    no_timestamp.remove("timestamp");
    assert_eq!(
        signing::check_at(&no_timestamp, SECRET, HashType::Md5, now),
        Verification::MissingTimestamp
    );

    let mut garbled = params;
    garbled.insert("timestamp".into(), "yesterday".into());
    assert_eq!(
        signing::check_at(&garbled, SECRET, HashType::Md5, now),
        Verification::InvalidTimestamp
    );
}
