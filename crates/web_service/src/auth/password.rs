//! bcrypt runs on the blocking pool; at cost 12 a hash takes long enough to
//! stall a worker thread.

use super::AuthError;

pub async fn hash_password(password: String, cost: u32) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|error| AuthError::Task(error.to_string()))?
        .map_err(AuthError::from)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|error| AuthError::Task(error.to_string()))?
        .map_err(AuthError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("Sup3r!secret".to_string(), 4)
            .await
            .unwrap();
        assert_ne!(hash, "Sup3r!secret");
        assert!(verify_password("Sup3r!secret".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        let result = verify_password("pw".to_string(), "not-a-hash".to_string()).await;
        assert!(matches!(result, Err(AuthError::Hash(_))));
    }
}
