//! Field format rules shared by registration, profile edits and posting.

use crate::error::{ApiError, ApiResult};

/// Length bounds (in characters, inclusive) plus an optional
/// ASCII-alphanumeric restriction.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub min: usize,
    pub max: usize,
    pub alphanumeric: bool,
}

pub const USERNAME: FieldRule = FieldRule { name: "username", min: 6, max: 16, alphanumeric: true };
pub const PASSWORD: FieldRule = FieldRule { name: "password", min: 6, max: 32, alphanumeric: true };
pub const NICKNAME: FieldRule = FieldRule { name: "nickname", min: 6, max: 16, alphanumeric: true };
pub const TITLE: FieldRule = FieldRule { name: "title", min: 6, max: 255, alphanumeric: false };
pub const SUBJECT: FieldRule = FieldRule { name: "subject", min: 6, max: 255, alphanumeric: false };
pub const CONTENT: FieldRule = FieldRule { name: "content", min: 6, max: 8192, alphanumeric: false };

impl FieldRule {
    pub fn is_valid(&self, value: &str) -> bool {
        let len = value.chars().count();
        if len < self.min || len > self.max {
            return false;
        }
        !self.alphanumeric || value.chars().all(|c| c.is_ascii_alphanumeric())
    }

    pub fn check(&self, value: &str) -> ApiResult<()> {
        if self.is_valid(value) {
            return Ok(());
        }
        let shape = if self.alphanumeric { " alphanumeric" } else { "" };
        Err(ApiError::Malformed(format!(
            "{} must be {}-{}{} characters",
            self.name, self.min, self.max, shape
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_bounds() {
        assert!(USERNAME.is_valid("alice01"));
        assert!(USERNAME.is_valid("abcdef"));
        assert!(USERNAME.is_valid("abcdefghijklmnop"));
        assert!(!USERNAME.is_valid("ghost"));
        assert!(!USERNAME.is_valid("abcdefghijklmnopq"));
        assert!(!USERNAME.is_valid("alice_01"));
        assert!(!USERNAME.is_valid("alice 01"));
    }

    #[test]
    fn password_allows_longer_values() {
        assert!(PASSWORD.is_valid(&"a".repeat(32)));
        assert!(!PASSWORD.is_valid(&"a".repeat(33)));
    }

    #[test]
    fn non_ascii_letters_are_not_alphanumeric_here() {
        assert!(!NICKNAME.is_valid("élodie99"));
    }

    #[test]
    fn content_counts_characters_not_bytes() {
        // 6 characters, 12 bytes
        assert!(CONTENT.is_valid("éééééé"));
        assert!(!CONTENT.is_valid("short"));
        assert!(CONTENT.is_valid("Hi everyone!!"));
        assert!(!CONTENT.is_valid(&"x".repeat(8193)));
    }

    #[test]
    fn check_explains_the_rule() {
        let err = TITLE.check("Hi").unwrap_err();
        assert_eq!(err, ApiError::Malformed("title must be 6-255 characters".into()));
        let err = NICKNAME.check("no").unwrap_err();
        assert_eq!(
            err,
            ApiError::Malformed("nickname must be 6-16 alphanumeric characters".into())
        );
    }
}
