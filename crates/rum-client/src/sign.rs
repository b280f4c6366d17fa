//! Batch signing.
//!
//! The collector authenticates each batch by recomputing
//! `MD5("<pid>:<secret>:<salt>")` and comparing it, as uppercase hex, with
//! the `sign` parameter. The salt is the signing time in Unix seconds.

use md5::{Digest, Md5};
use rum_types::EventRecord;
use serde::Serialize;

use crate::constants::ADDS_METHOD;
use crate::transport::{Quest, TransportError};

/// Uppercase hex MD5 of `"<project_id>:<secret_key>:<salt>"`.
pub fn compute_signature(project_id: i32, secret_key: &str, salt: i32) -> String {
    let mut hasher = Md5::new();
    hasher.update(project_id.to_string());
    hasher.update(b":");
    hasher.update(secret_key);
    hasher.update(b":");
    hasher.update(salt.to_string());
    hex::encode_upper(hasher.finalize())
}

/// A signed batch, in wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedRequest {
    #[serde(rename = "pid")]
    pub project_id: i32,
    pub salt: i32,
    #[serde(rename = "sign")]
    pub signature: String,
    pub events: Vec<EventRecord>,
}

impl SignedRequest {
    /// Collector method this request is sent under.
    pub fn method(&self) -> &'static str {
        ADDS_METHOD
    }

    /// Encode as a transport quest.
    pub fn to_quest(&self) -> Result<Quest, TransportError> {
        let params = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => return Err(TransportError::Encoding("request is not an object".into())),
            Err(e) => return Err(TransportError::Encoding(e.to_string())),
        };
        Ok(Quest {
            method: self.method().to_string(),
            params,
        })
    }
}

/// Holds the project credentials and signs batches with them.
#[derive(Clone)]
pub struct RequestSigner {
    project_id: i32,
    secret_key: String,
}

impl RequestSigner {
    pub fn new(project_id: i32, secret_key: impl Into<String>) -> Self {
        Self {
            project_id,
            secret_key: secret_key.into(),
        }
    }

    pub fn project_id(&self) -> i32 {
        self.project_id
    }

    /// Sign with the current time as salt.
    pub fn sign(&self, events: Vec<EventRecord>) -> SignedRequest {
        self.sign_with_salt(events, rum_types::now_secs())
    }

    pub fn sign_with_salt(&self, events: Vec<EventRecord>, salt: i32) -> SignedRequest {
        SignedRequest {
            project_id: self.project_id,
            salt,
            signature: compute_signature(self.project_id, &self.secret_key, salt),
            events,
        }
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rum_types::Attributes;

    fn event(name: &str) -> EventRecord {
        EventRecord {
            name: name.into(),
            session_id: 1,
            reporting_id: "1".into(),
            timestamp_seconds: 0,
            event_id: 2,
            source_tag: "rust".into(),
            attributes: Attributes::new(),
        }
    }

    #[test]
    fn test_signature_known_value() {
        let sig = compute_signature(1, "k", 2);
        assert_eq!(sig, "1894ABA50A761FC4B482F3C4E625164A");
        assert_eq!(sig.len(), 32);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_signature_matches_md5_of_joined_string() {
        let mut hasher = Md5::new();
        hasher.update(b"41000015:affc562c:1700000000");
        let expected = hex::encode_upper(hasher.finalize());
        assert_eq!(compute_signature(41000015, "affc562c", 1700000000), expected);
    }

    #[test]
    fn test_signature_deterministic_per_triple() {
        let signer = RequestSigner::new(7, "secret");
        let a = signer.sign_with_salt(vec![event("a")], 1234);
        let b = signer.sign_with_salt(vec![event("b"), event("c")], 1234);
        let c = signer.sign_with_salt(vec![event("a")], 1235);

        assert_eq!(a.signature, b.signature);
        assert_ne!(a.signature, c.signature);
    }

    #[test]
    fn test_sign_uses_current_time_salt() {
        let before = rum_types::now_secs();
        let request = RequestSigner::new(7, "secret").sign(vec![event("a")]);
        assert!(request.salt >= before);
        assert_eq!(request.signature, compute_signature(7, "secret", request.salt));
    }

    #[test]
    fn test_quest_wire_shape() {
        let request = RequestSigner::new(7, "secret").sign_with_salt(vec![event("a")], 99);
        let quest = request.to_quest().unwrap();

        assert_eq!(quest.method, "adds");
        assert_eq!(quest.get("pid"), Some(&serde_json::Value::from(7)));
        assert_eq!(quest.get("salt"), Some(&serde_json::Value::from(99)));
        assert_eq!(
            quest.get("sign").and_then(|v| v.as_str()),
            Some(request.signature.as_str())
        );
        assert_eq!(quest.get("events").and_then(|v| v.as_array()).map(Vec::len), Some(1));
        assert!(quest.get("secret_key").is_none());
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", RequestSigner::new(7, "hunter2"));
        assert!(!debug.contains("hunter2"));
    }
}
