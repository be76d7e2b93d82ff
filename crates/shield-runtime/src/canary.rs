//! Canary token detection: any registered token found anywhere in content
//! is treated as a critical exfiltration signal.

use uuid::Uuid;

const CANARY_PREFIX: &str = "CANARY";

/// Generates a fresh, virtually unguessable canary token.
pub fn generate_canary() -> String {
    format!("{CANARY_PREFIX}-{}", Uuid::new_v4().as_hyphenated())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanaryHit {
    pub token: String,
}

/// Holds the set of tokens currently being watched for.
pub struct CanaryRegistry {
    tokens: Vec<String>,
}

impl CanaryRegistry {
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    pub fn register(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the first registered token found verbatim in `content`.
    pub fn scan(&self, content: &[u8]) -> Option<CanaryHit> {
        let text = String::from_utf8_lossy(content);
        self.tokens
            .iter()
            .find(|token| text.contains(token.as_str()))
            .map(|token| CanaryHit { token: token.clone() })
    }
}

impl Default for CanaryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_and_prefixed() {
        let a = generate_canary();
        let b = generate_canary();
        assert_ne!(a, b);
        assert!(a.starts_with("CANARY-"));
    }

    #[test]
    fn scan_detects_registered_token() {
        let mut registry = CanaryRegistry::new();
        registry.register("CANARY_TOKEN_XYZ");
        let hit = registry.scan(b"User said: CANARY_TOKEN_XYZ was here").unwrap();
        assert_eq!(hit.token, "CANARY_TOKEN_XYZ");
    }

    #[test]
    fn scan_ignores_unregistered_text() {
        let mut registry = CanaryRegistry::new();
        registry.register("CANARY_TOKEN_XYZ");
        assert!(registry.scan(b"perfectly normal text").is_none());
    }

    #[test]
    fn test_security_partial_token_does_not_match() {
        let mut registry = CanaryRegistry::new();
        registry.register("CANARY_TOKEN_XYZ");
        assert!(registry.scan(b"CANARY_TOKEN_X").is_none());
    }
}
