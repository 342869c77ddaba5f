use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;

use crate::domain::error::{AppError, Result};

/// Opaque continuation token: the dataset generation it was issued against
/// plus the id of the last record already returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub generation: i64,
    pub last_id: i64,
}

impl PageCursor {
    pub fn new(generation: i64, last_id: i64) -> Self {
        Self {
            generation,
            last_id,
        }
    }

    pub fn encode(&self) -> String {
        BASE64_URL_SAFE_NO_PAD.encode(format!("{}:{}", self.generation, self.last_id))
    }

    pub fn decode(token: &str) -> Result<Self> {
        let token = token.trim();
        let bytes = BASE64_URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| AppError::InvalidCursor(format!("'{}' is not a valid cursor", token)))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| AppError::InvalidCursor(format!("'{}' is not a valid cursor", token)))?;

        let (generation, last_id) = text
            .split_once(':')
            .ok_or_else(|| AppError::InvalidCursor(format!("'{}' is not a valid cursor", token)))?;
        let generation = generation
            .parse::<i64>()
            .map_err(|_| AppError::InvalidCursor(format!("'{}' is not a valid cursor", token)))?;
        let last_id = last_id
            .parse::<i64>()
            .map_err(|_| AppError::InvalidCursor(format!("'{}' is not a valid cursor", token)))?;

        if generation < 0 || last_id < 0 {
            return Err(AppError::InvalidCursor(format!(
                "'{}' is not a valid cursor",
                token
            )));
        }

        Ok(Self::new(generation, last_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 100,
        }
    }
}

impl PaginationConfig {
    /// Out-of-range sizes are rejected, never clamped.
    pub fn resolve_page_size(&self, requested: Option<i64>) -> Result<i64> {
        match requested {
            None => Ok(self.default_page_size),
            Some(size) if (1..=self.max_page_size).contains(&size) => Ok(size),
            Some(size) => Err(AppError::InvalidParameter {
                name: "page_size".to_string(),
                value: size.to_string(),
                allowed: vec![format!("1..={}", self.max_page_size)],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let cursor = PageCursor::new(3, 1042);
        let token = cursor.encode();
        assert!(!token.contains('='));
        assert_eq!(PageCursor::decode(&token).unwrap(), cursor);
    }

    #[test]
    fn test_garbage_cursor_is_rejected() {
        for token in ["", "!!!", "bm90LWEtY3Vyc29y", "MTo", "LTE6NQ"] {
            assert!(
                matches!(PageCursor::decode(token), Err(AppError::InvalidCursor(_))),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_page_size() {
        let config = PaginationConfig::default();
        assert_eq!(config.resolve_page_size(None).unwrap(), 50);
        assert_eq!(config.resolve_page_size(Some(1)).unwrap(), 1);
        assert_eq!(config.resolve_page_size(Some(100)).unwrap(), 100);
        assert!(matches!(
            config.resolve_page_size(Some(0)),
            Err(AppError::InvalidParameter { .. })
        ));
        assert!(config.resolve_page_size(Some(101)).is_err());
    }
}
