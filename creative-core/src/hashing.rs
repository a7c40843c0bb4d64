//! Fingerprints - SHA-256 over Artifacts and Jobs
//!
//! The stored PNG gets a content digest; the request gets a job hash so two
//! identical requests can be recognised in logs even though their ids differ.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write;

pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// JSON with object keys sorted at every level, no whitespace.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v = serde_json::to_value(value)?;
    serde_json::to_string(&sort_keys(v))
}

fn sort_keys(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// job_hash = sha256(retailer : format : canonical_inputs : engine_version)
pub fn compute_job_hash(
    retailer: &str,
    format: &str,
    inputs: &impl Serialize,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(inputs)?;
    let combined = format!("{}:{}:{}:{}", retailer, format, canonical, engine_version);
    Ok(sha256_hex(combined.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": {"y": 2, "b": 3}, "m": [{"k": 1, "c": 2}]});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":{"b":3,"y":2},"m":[{"c":2,"k":1}],"z":1}"#);
    }

    #[test]
    fn test_job_hash_depends_on_every_part() {
        let inputs = json!({"headline": "Fresh", "packshot": "abc"});
        let base = compute_job_hash("default", "feed", &inputs, "1.0.0").unwrap();
        assert_eq!(base, compute_job_hash("default", "feed", &inputs, "1.0.0").unwrap());
        assert_ne!(base, compute_job_hash("default", "story", &inputs, "1.0.0").unwrap());
        assert_ne!(base, compute_job_hash("acme", "feed", &inputs, "1.0.0").unwrap());
    }
}
