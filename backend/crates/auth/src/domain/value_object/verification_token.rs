use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use platform::crypto::{random_bytes, to_base64_url};

const TOKEN_BYTES: usize = 32;

/// Opaque handle for a pending verification, returned to the client in place
/// of the code itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationToken(String);

impl VerificationToken {
    pub fn generate() -> Self {
        Self(to_base64_url(&random_bytes(TOKEN_BYTES)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for VerificationToken {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl Borrow<str> for VerificationToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_url_safe() {
        let token = VerificationToken::generate();
        // 32 bytes, unpadded base64
        assert_eq!(token.as_str().len(), 43);
        assert!(
            token
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(VerificationToken::generate(), VerificationToken::generate());
    }
}
