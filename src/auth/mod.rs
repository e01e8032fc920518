pub mod memory;
pub mod platform;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::database::Product;

pub use memory::MemoryCredentialStore;
pub use platform::PlatformAuthClient;

/// The account behind a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: String,
    pub profile: UserProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: Option<String>,
}

impl UserIdentity {
    pub fn owns(&self, product: &Product) -> bool {
        product.user_id == self.id
    }
}

/// Extra attributes recorded with a new account.
#[derive(Debug, Clone, Default)]
pub struct AccountAttributes {
    pub display_name: Option<String>,
}

/// Tokens issued by a successful password sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: String,
    pub user: UserIdentity,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidToken(String),

    #[error("{0}")]
    InvalidCredentials(String),

    /// The credential store refused to create the account.
    #[error("{0}")]
    Rejected(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("Auth service unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Unavailable(err.to_string())
    }
}

/// Identity provider: issues and validates bearer tokens.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<UserIdentity, AuthError>;

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        attributes: AccountAttributes,
    ) -> Result<UserIdentity, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;
}
