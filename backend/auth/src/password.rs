use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AuthError, AuthResult};

pub fn hash_password(plaintext: &str) -> AuthResult<String> {
    hash(plaintext, DEFAULT_COST).map_err(|_| AuthError::Malformed)
}

pub fn verify_password(plaintext: &str, hashed: &str) -> AuthResult<()> {
    match verify(plaintext, hashed) {
        Ok(true) => Ok(()),
        _ => Err(AuthError::InvalidCredentials),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hashed = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hashed).is_ok());
        assert!(verify_password("wrong", &hashed).is_err());
    }
}
