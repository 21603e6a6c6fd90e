//! Change detection for outbound requests.

use std::fmt;

use serde_json::json;
use sha2::Digest;
use sha2::Sha256;

use super::RequestPayload;

/// Canonical string of a request: its path plus every parameter.
///
/// Two payloads that flatten to the same parameters produce the same
/// signature, whatever order they were assembled in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestSignature(String);

impl RequestSignature {
    pub fn new(path: &str, payload: &RequestPayload) -> Self {
        let canonical = json!({
            "path": path,
            "params": payload.to_json(),
        });
        Self(canonical.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SHA-256 of the signature, hex encoded. Short enough for log lines.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.0.as_bytes()))
    }
}

impl fmt::Display for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
