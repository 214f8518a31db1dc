use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{Direction, GridPos};

/// Visible-character limit enforced client-side when choosing a name.
pub const MAX_USERNAME_LEN: usize = 15;

/// The server never validates names, it only cuts off anything absurd.
pub const USERNAME_HARD_CAP: usize = 64;

/// What the relay knows about a peer, and all that remote clients mirror.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlayerRecord {
    pub username: String,
    pub position: GridPos,
    pub facing: Direction,
}

impl Default for PlayerRecord {
    fn default() -> Self {
        Self {
            username: String::new(),
            position: GridPos::default(),
            facing: Direction::Forward,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("username is empty")]
    Empty,
    #[error("username exceeds {MAX_USERNAME_LEN} characters")]
    TooLong,
}

/// Client-side username check: 1 to [`MAX_USERNAME_LEN`] visible characters.
pub fn validate_username(name: &str) -> Result<(), UsernameError> {
    let visible = name.trim();
    if visible.is_empty() {
        return Err(UsernameError::Empty);
    }
    if visible.chars().count() > MAX_USERNAME_LEN {
        return Err(UsernameError::TooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        assert!(validate_username("speedy").is_ok());
        assert!(validate_username("a").is_ok());
        assert!(validate_username("fifteen_chars__").is_ok());
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(validate_username(""), Err(UsernameError::Empty));
        assert_eq!(validate_username("   "), Err(UsernameError::Empty));
    }

    #[test]
    fn rejects_overlong_names() {
        assert_eq!(
            validate_username("sixteen_chars___"),
            Err(UsernameError::TooLong)
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 8 characters, 12 bytes
        assert!(validate_username("züführäß").is_ok());
    }
}
