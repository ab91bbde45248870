//! Strongly-typed identifiers for provisioning entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque continuation handle returned by the registry for an in-flight registration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationToken(String);

impl RegistrationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one creation attempt (the client request token of the request
/// that started it)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(String);

impl AttemptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_serializes_as_plain_string() {
        let token = RegistrationToken::new("tok-1");
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"tok-1\"");
        assert_eq!(token.to_string(), "tok-1");
    }

    #[test]
    fn generated_attempt_ids_are_unique() {
        assert_ne!(AttemptId::generate(), AttemptId::generate());
        assert_eq!(AttemptId::new("abc").to_string(), "attempt:abc");
    }
}
