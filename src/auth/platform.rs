//! Client for the hosted platform's auth service (GoTrue-compatible REST API).

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;
use uuid::Uuid;

use super::{AccountAttributes, AuthError, AuthSession, CredentialStore, UserIdentity, UserProfile};
use crate::config::PlatformConfig;

/// Audience the platform stamps on end-user access tokens.
const TOKEN_AUDIENCE: &str = "authenticated";

pub struct PlatformAuthClient {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
    service_role_key: String,
    jwt_key: Option<DecodingKey>,
}

#[derive(Debug, Deserialize)]
struct PlatformUser {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct PlatformSession {
    access_token: String,
    token_type: String,
    expires_in: i64,
    refresh_token: String,
    user: PlatformUser,
}

#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Map<String, Value>,
}

fn identity(id: Uuid, email: Option<String>, metadata: &Map<String, Value>) -> UserIdentity {
    UserIdentity {
        id,
        email: email.unwrap_or_default(),
        profile: UserProfile {
            display_name: metadata
                .get("display_name")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
    }
}

impl From<PlatformUser> for UserIdentity {
    fn from(user: PlatformUser) -> Self {
        identity(user.id, user.email, &user.user_metadata)
    }
}

impl PlatformAuthClient {
    pub fn new(config: &PlatformConfig) -> Result<Self, AuthError> {
        let raw = config
            .url
            .as_deref()
            .ok_or(AuthError::ConfigMissing("SUPABASE_URL"))?;
        let mut base = Url::parse(raw).map_err(|_| AuthError::InvalidConfig("SUPABASE_URL"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let anon_key = config
            .anon_key
            .clone()
            .ok_or(AuthError::ConfigMissing("SUPABASE_ANON_KEY"))?;
        let service_role_key = config
            .service_role_key
            .clone()
            .ok_or(AuthError::ConfigMissing("SUPABASE_SERVICE_ROLE_KEY"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base,
            anon_key,
            service_role_key,
            jwt_key: config
                .jwt_secret
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| DecodingKey::from_secret(s.as_bytes())),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.base
            .join(path)
            .map_err(|_| AuthError::InvalidConfig("SUPABASE_URL"))
    }

    fn verify_locally(token: &str, key: &DecodingKey) -> Result<UserIdentity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[TOKEN_AUDIENCE]);

        let data = decode::<AccessClaims>(token, key, &validation)
            .map_err(|e| AuthError::InvalidToken(format!("Invalid JWT token: {}", e)))?;
        let claims = data.claims;
        Ok(identity(claims.sub, claims.email, &claims.user_metadata))
    }
}

/// Best human-readable message from a platform error body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(msg) = map.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }
    if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Auth service error")
        .to_string()
}

async fn failure(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error_message(status, &body)
}

#[async_trait]
impl CredentialStore for PlatformAuthClient {
    async fn verify_token(&self, token: &str) -> Result<UserIdentity, AuthError> {
        if let Some(key) = &self.jwt_key {
            return Self::verify_locally(token, key);
        }

        let response = self
            .http
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::InvalidToken(failure(response).await));
        }
        let user: PlatformUser = response.json().await?;
        Ok(user.into())
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        attributes: AccountAttributes,
    ) -> Result<UserIdentity, AuthError> {
        let body = json!({
            "email": email,
            "password": password,
            "email_confirm": true,
            "user_metadata": { "display_name": attributes.display_name },
        });

        let response = self
            .http
            .post(self.endpoint("auth/v1/admin/users")?)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Rejected(failure(response).await));
        }
        let user: PlatformUser = response.json().await?;
        Ok(user.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::InvalidCredentials(failure(response).await));
        }
        let session: PlatformSession = response.json().await?;
        Ok(AuthSession {
            access_token: session.access_token,
            token_type: session.token_type,
            expires_in: session.expires_in,
            refresh_token: session.refresh_token,
            user: session.user.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    fn config() -> PlatformConfig {
        PlatformConfig {
            url: Some("https://project.supabase.co".into()),
            anon_key: Some("anon".into()),
            service_role_key: Some("service".into()),
            jwt_secret: Some(SECRET.into()),
            request_timeout_secs: 5,
        }
    }

    fn token(claims: Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    fn exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[tokio::test]
    async fn verifies_signed_tokens_locally() {
        let client = PlatformAuthClient::new(&config()).unwrap();
        let id = Uuid::new_v4();
        let jwt = token(json!({
            "sub": id,
            "email": "a@example.com",
            "aud": "authenticated",
            "exp": exp(),
            "user_metadata": { "display_name": "Alice" },
        }));

        let user = client.verify_token(&jwt).await.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.profile.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn rejects_wrong_audience_and_garbage() {
        let client = PlatformAuthClient::new(&config()).unwrap();
        let jwt = token(json!({ "sub": Uuid::new_v4(), "aud": "anon", "exp": exp() }));

        assert!(matches!(client.verify_token(&jwt).await, Err(AuthError::InvalidToken(_))));
        assert!(matches!(client.verify_token("not-a-jwt").await, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn requires_platform_settings() {
        let mut missing = config();
        missing.service_role_key = None;
        assert!(matches!(
            PlatformAuthClient::new(&missing),
            Err(AuthError::ConfigMissing("SUPABASE_SERVICE_ROLE_KEY"))
        ));
    }

    #[test]
    fn endpoints_keep_project_path() {
        let mut nested = config();
        nested.url = Some("http://localhost:54321/project".into());
        let client = PlatformAuthClient::new(&nested).unwrap();
        assert_eq!(
            client.endpoint("auth/v1/user").unwrap().as_str(),
            "http://localhost:54321/project/auth/v1/user"
        );
    }

    #[test]
    fn extracts_platform_error_messages() {
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#
            ),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(StatusCode::UNPROCESSABLE_ENTITY, r#"{"code":422,"msg":"User already registered"}"#),
            "User already registered"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
    }
}
