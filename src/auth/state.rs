//! CSRF state tokens for the OAuth redirect

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Random bytes per state token
pub const STATE_TOKEN_BYTES: usize = 32;

/// Generate a random CSRF state token (base64url, no padding)
pub fn issue_state_token() -> String {
    let mut bytes = [0_u8; STATE_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare the state saved in the cookie with the one GitHub sent back.
///
/// Absence of either side, or any difference, fails.
pub fn validate_state_token(saved: Option<&str>, received: Option<&str>) -> bool {
    match (saved, received) {
        (Some(saved), Some(received)) => !saved.is_empty() && saved == received,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_are_long_and_unique() {
        let first = issue_state_token();
        let second = issue_state_token();

        assert_eq!(URL_SAFE_NO_PAD.decode(&first).unwrap().len(), STATE_TOKEN_BYTES);
        assert_ne!(first, second);
        assert!(
            first
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn identical_tokens_validate() {
        let token = issue_state_token();
        assert!(validate_state_token(Some(&token), Some(&token)));
    }

    #[test]
    fn mismatch_or_absence_fails() {
        let token = issue_state_token();
        let other = issue_state_token();

        assert!(!validate_state_token(Some(&token), Some(&other)));
        assert!(!validate_state_token(None, Some(&token)));
        assert!(!validate_state_token(Some(&token), None));
        assert!(!validate_state_token(None, None));
        assert!(!validate_state_token(Some(""), Some("")));
    }

    #[test]
    fn comparison_is_exact() {
        assert!(!validate_state_token(Some("abc"), Some("ABC")));
        assert!(!validate_state_token(Some("abc"), Some("abc ")));
    }
}
