// Password hashing on the blocking pool

use crate::core::error::AppError;

/// Hash a password with a fresh salt
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored hash.
///
/// `Ok(false)` means the password is wrong; a malformed hash is an error.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();

    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("pw1234", TEST_COST).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert_ne!(hash, "pw1234");

        assert!(verify_password("pw1234", &hash).await.unwrap());
        assert!(!verify_password("pw1235", &hash).await.unwrap());
        assert!(!verify_password("", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let a = hash_password("same-password", TEST_COST).await.unwrap();
        let b = hash_password("same-password", TEST_COST).await.unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same-password", &a).await.unwrap());
        assert!(verify_password("same-password", &b).await.unwrap());
    }

    #[tokio::test]
    async fn test_round_trip_over_assorted_passwords() {
        let passwords = ["abcd", "パスワード", "with spaces and symbols !@#", "0000"];
        for (i, password) in passwords.iter().enumerate() {
            let hash = hash_password(password, TEST_COST).await.unwrap();
            assert!(verify_password(password, &hash).await.unwrap());
            let other = passwords[(i + 1) % passwords.len()];
            assert!(!verify_password(other, &hash).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_malformed_hash_is_an_error() {
        let result = verify_password("pw1234", "not-a-bcrypt-hash").await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
