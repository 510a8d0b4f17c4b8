use crate::{error, management::TokenManager, spotify, success};

pub async fn auth() {
    match spotify::auth::authorize().await {
        Ok(token) => {
            let manager = TokenManager::new(token);
            if let Err(e) = manager.persist().await {
                error!("Failed to save token to cache: {}", e);
            }
            success!("Authentication successful!");
        }
        Err(e) => {
            error!("Authentication failed: {}", e);
        }
    }
}
