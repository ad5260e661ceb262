//! Pickup code handshake between rider and driver.
//!
//! When a bid is accepted the trip receives a 4-digit code. The rider is shown
//! the plaintext, the driver only ever submits what the rider tells them and
//! the server compares digests. The code space is 10^4 and there is no lockout
//! on failed attempts, so the code is only meaningful for the lifetime of a
//! single trip.

use rand::Rng;
use sha2::{Digest, Sha256};

pub const CODE_LENGTH: usize = 4;

/// Uniformly samples a zero-padded code in `"0000"..="9999"`.
pub fn generate_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{:04}", code)
}

/// Hex SHA-256 of the code. Unsalted: the secret is single-use and scoped to
/// one trip.
pub fn hash(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// Malformed input is rejected before any hashing happens.
pub fn verify(entered_code: &str, stored_hash: &str) -> bool {
    if !is_well_formed(entered_code) {
        return false;
    }

    hash(entered_code) == stored_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_four_digits() {
        for _ in 0..500 {
            let code = generate_code();
            assert!(is_well_formed(&code), "{} is not a valid code", code);
        }
    }

    #[test]
    fn hash_is_deterministic_hex() {
        let digest = hash("4821");
        assert_eq!(digest, hash("4821"));
        assert_eq!(digest.len(), 64);
        assert!(digest.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn every_code_verifies_against_its_own_hash() {
        for n in (0..10_000).step_by(97) {
            let code = format!("{:04}", n);
            assert!(verify(&code, &hash(&code)));
        }
    }

    #[test]
    fn different_code_is_rejected() {
        assert!(!verify("0000", &hash("4821")));
        assert!(!verify("4812", &hash("4821")));
    }

    #[test]
    fn malformed_input_is_rejected() {
        let stored = hash("1234");

        assert!(!verify("", &stored));
        assert!(!verify("123", &stored));
        assert!(!verify("12345", &stored));
        assert!(!verify("12a4", &stored));
        assert!(!verify(" 234", &stored));
        assert!(!verify("١٢٣٤", &stored));
    }

    #[test]
    fn malformed_input_matching_a_digest_is_still_rejected() {
        // Even if someone stores the digest of a malformed value, verify never
        // gets as far as hashing it.
        assert!(!verify("12345", &hash("12345")));
    }
}
