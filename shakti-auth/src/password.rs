use anyhow::Result;
use rand::distributions::Alphanumeric;
use rand::Rng;
use shakti_core::ShaktiError;

pub const TEMPORARY_PASSWORD_LEN: usize = 10;

pub fn hash_password(plain: &str, cost: u32) -> Result<String> {
    if plain.is_empty() {
        return Err(ShaktiError::unprocessable("Password cannot be empty").into_anyhow());
    }
    bcrypt::hash(plain, cost)
        .map_err(|e| ShaktiError::general_error("Could not hash password").with_source(e.into()).into_anyhow())
}

/// `false` for a wrong password and for a malformed stored hash.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match bcrypt::verify(plain, hash) {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash could not be checked");
            false
        }
    }
}

pub fn generate_temporary_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("s3cret!", 4).unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("S3cret!", &hash));
        assert!(!verify_password("s3cret!", "not-a-hash"));
    }

    #[test]
    fn empty_passwords_are_rejected() {
        let err = hash_password("", 4).unwrap_err();
        assert_eq!(ShaktiError::from_anyhow(&err).unwrap().code(), 422);
    }

    #[test]
    fn temporary_passwords_are_alphanumeric() {
        let p = generate_temporary_password();
        assert_eq!(p.len(), TEMPORARY_PASSWORD_LEN);
        assert!(p.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
