use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountAttributes, AuthError, AuthSession, CredentialStore, UserIdentity, UserProfile};

const TOKEN_TTL_SECS: u64 = 3600;
const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    identity: UserIdentity,
    salt: String,
    password_digest: String,
}

struct IssuedToken {
    email: String,
    expires_at: Instant,
}

/// Process-local accounts and opaque bearer tokens, for development and tests.
pub struct MemoryCredentialStore {
    accounts: RwLock<HashMap<String, Account>>,
    tokens: RwLock<HashMap<String, IssuedToken>>,
    token_ttl: Duration,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::with_token_ttl(Duration::from_secs(TOKEN_TTL_SECS))
    }

    pub fn with_token_ttl(token_ttl: Duration) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
            token_ttl,
        }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}

fn random_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn verify_token(&self, token: &str) -> Result<UserIdentity, AuthError> {
        let email = {
            let mut tokens = self.tokens.write().await;
            let (email, expired) = tokens
                .get(token)
                .map(|issued| (issued.email.clone(), issued.expires_at <= Instant::now()))
                .ok_or_else(|| AuthError::InvalidToken("Unknown token".to_string()))?;
            if expired {
                tokens.remove(token);
                return Err(AuthError::InvalidToken("Token has expired".to_string()));
            }
            email
        };

        self.accounts
            .read()
            .await
            .get(&email)
            .map(|account| account.identity.clone())
            .ok_or_else(|| AuthError::InvalidToken("User not found".to_string()))
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        attributes: AccountAttributes,
    ) -> Result<UserIdentity, AuthError> {
        let email = normalize_email(email);
        if !is_plausible_email(&email) {
            return Err(AuthError::Rejected(
                "Unable to validate email address: invalid format".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Rejected(format!(
                "Password should be at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&email) {
            return Err(AuthError::Rejected(
                "A user with this email address has already been registered".to_string(),
            ));
        }

        let identity = UserIdentity {
            id: Uuid::new_v4(),
            email: email.clone(),
            profile: UserProfile {
                display_name: attributes.display_name,
            },
        };
        let salt = random_token();
        accounts.insert(
            email,
            Account {
                identity: identity.clone(),
                password_digest: digest(&salt, password),
                salt,
            },
        );

        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        let identity = {
            let accounts = self.accounts.read().await;
            match accounts.get(&email) {
                Some(account) if account.password_digest == digest(&account.salt, password) => {
                    account.identity.clone()
                }
                _ => {
                    return Err(AuthError::InvalidCredentials(
                        "Invalid login credentials".to_string(),
                    ))
                }
            }
        };

        let access_token = random_token();
        let now = Instant::now();
        {
            let mut tokens = self.tokens.write().await;
            tokens.retain(|_, issued| issued.expires_at > now);
            tokens.insert(
                access_token.clone(),
                IssuedToken {
                    email,
                    expires_at: now + self.token_ttl,
                },
            );
        }

        Ok(AuthSession {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.token_ttl.as_secs() as i64,
            refresh_token: random_token(),
            user: identity,
        })
    }
}
