//! Bearer credential obtained from the external login service.

use std::fmt;
use std::sync::RwLock;

use crate::error::{AppError, Result};

/// Bearer token sent on authenticated calls
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep tokens out of logs.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Session credential store shared by the services
#[derive(Debug, Default)]
pub struct Credentials {
    token: RwLock<Option<BearerToken>>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let credentials = Self::new();
        credentials.set_token(token);
        credentials
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(BearerToken(token.into()));
    }

    pub fn clear(&self) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// Current token, or `Unauthorized` when none (or a blank one) is held.
    pub fn bearer(&self) -> Result<BearerToken> {
        let slot = self.token.read().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            Some(token) if !token.0.trim().is_empty() => Ok(token.clone()),
            _ => Err(AppError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_is_unauthorized() {
        let credentials = Credentials::new();
        assert_eq!(credentials.bearer(), Err(AppError::Unauthorized));
    }

    #[test]
    fn test_blank_token_is_unauthorized() {
        let credentials = Credentials::with_token("   ");
        assert_eq!(credentials.bearer(), Err(AppError::Unauthorized));
    }

    #[test]
    fn test_set_and_clear() {
        let credentials = Credentials::with_token("abc");
        assert_eq!(credentials.bearer().unwrap().as_str(), "abc");
        assert_eq!(format!("{:?}", credentials.bearer().unwrap()), "BearerToken(***)");

        credentials.clear();
        assert!(credentials.bearer().is_err());
    }
}
