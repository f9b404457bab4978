use rand::Rng;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::error::AuthError;

/// Generate a fresh 6-digit reset code, zero padded, drawn uniformly.
pub fn generate() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{code:06}")
}

/// SHA-256 hex digest of a code. Only the digest is stored, so a leaked
/// users table does not expose live reset codes.
pub fn digest(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// Decide whether a presented code matches the pending one. `stored` is the
/// `(digest, deadline)` pair from the user record, if a reset is pending.
///
/// This classifies the failure for the caller; the conditional UPDATE in
/// `User::consume_reset_otp` is the enforcement point under concurrency.
pub fn check(
    stored: Option<(&str, OffsetDateTime)>,
    presented: &str,
    now: OffsetDateTime,
) -> Result<(), AuthError> {
    let (stored_hash, expires_at) = match stored {
        Some(pair) => pair,
        None => return Err(AuthError::InvalidOtp),
    };
    if digest(presented) != stored_hash {
        return Err(AuthError::InvalidOtp);
    }
    if now > expires_at {
        return Err(AuthError::ExpiredOtp);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn generated_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn digest_is_stable_and_distinguishes_codes() {
        assert_eq!(digest("123456"), digest("123456"));
        assert_ne!(digest("123456"), digest("654321"));
        // sha256("123456")
        assert_eq!(
            digest("123456"),
            "8d969eef6ecad3c29a3a629280e686cf0c3f5d5a86aff3ca12020c923adc6c92"
        );
    }

    #[test]
    fn check_accepts_matching_unexpired_code() {
        let now = OffsetDateTime::now_utc();
        let stored = digest("123456");
        assert!(check(Some((&stored, now + Duration::minutes(15))), "123456", now).is_ok());
    }

    #[test]
    fn check_rejects_when_no_code_pending() {
        let now = OffsetDateTime::now_utc();
        assert!(matches!(
            check(None, "123456", now),
            Err(AuthError::InvalidOtp)
        ));
    }

    #[test]
    fn check_rejects_wrong_code() {
        let now = OffsetDateTime::now_utc();
        let stored = digest("123456");
        assert!(matches!(
            check(Some((&stored, now + Duration::minutes(15))), "000000", now),
            Err(AuthError::InvalidOtp)
        ));
    }

    #[test]
    fn check_rejects_expired_code_even_when_it_matches() {
        let now = OffsetDateTime::now_utc();
        let stored = digest("123456");
        assert!(matches!(
            check(Some((&stored, now - Duration::minutes(1))), "123456", now),
            Err(AuthError::ExpiredOtp)
        ));
    }

    #[test]
    fn reissuing_invalidates_the_first_code() {
        let now = OffsetDateTime::now_utc();
        let first = "111111";
        let second = "222222";
        // Issuing overwrites the stored digest, so only the second code checks out.
        let stored = digest(second);
        let deadline = now + Duration::minutes(15);
        assert!(matches!(
            check(Some((&stored, deadline)), first, now),
            Err(AuthError::InvalidOtp)
        ));
        assert!(check(Some((&stored, deadline)), second, now).is_ok());
    }
}
