use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub backend: StoreBackend,
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub platform: PlatformConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Where products, profiles and accounts live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreBackend {
    /// Hosted platform: managed Postgres plus its auth service
    Postgres,
    /// Process-local maps; state is lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "platform" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Prefix the API is mounted under, e.g. `/functions/v1`. Empty mounts at the root.
    pub base_path: String,
    pub request_timeout_secs: u64,
    pub max_request_size_bytes: usize,
}

impl ApiConfig {
    /// `base_path` with a leading slash and no trailing slash; empty for the root.
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

/// Hosted auth service settings.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub service_role_key: Option<String>,
    /// When set, access tokens are verified locally instead of by a round trip.
    pub jwt_secret: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// `*` allows every origin.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.backend = v.parse().unwrap_or(self.backend);
        }

        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // API overrides
        if let Ok(v) = env::var("API_BASE_PATH") {
            self.api.base_path = v;
        }
        if let Ok(v) = env::var("API_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().unwrap_or(self.api.request_timeout_secs);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Platform overrides
        self.platform.url = env::var("SUPABASE_URL").ok().or(self.platform.url);
        self.platform.anon_key = env::var("SUPABASE_ANON_KEY").ok().or(self.platform.anon_key);
        self.platform.service_role_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .ok()
            .or(self.platform.service_role_key);
        self.platform.jwt_secret = env::var("SUPABASE_JWT_SECRET").ok().or(self.platform.jwt_secret);

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            backend: StoreBackend::Memory,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            api: ApiConfig {
                base_path: String::new(),
                request_timeout_secs: 30,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            platform: PlatformConfig {
                url: None,
                anon_key: None,
                service_role_key: None,
                jwt_secret: None,
                request_timeout_secs: 15,
            },
            security: SecurityConfig {
                cors_origins: vec!["*".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            backend: StoreBackend::Postgres,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            api: ApiConfig {
                base_path: String::new(),
                request_timeout_secs: 15,
                max_request_size_bytes: 256 * 1024,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            platform: PlatformConfig {
                url: None,
                anon_key: None,
                service_role_key: None,
                jwt_secret: None,
                request_timeout_secs: 10,
            },
            security: SecurityConfig {
                cors_origins: vec!["*".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            backend: StoreBackend::Postgres,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            api: ApiConfig {
                base_path: String::new(),
                request_timeout_secs: 10,
                max_request_size_bytes: 256 * 1024,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            platform: PlatformConfig {
                url: None,
                anon_key: None,
                service_role_key: None,
                jwt_secret: None,
                request_timeout_secs: 5,
            },
            security: SecurityConfig {
                cors_origins: vec!["*".to_string()],
            },
        }
    }
}

// Process-wide config for the binary; library code takes config by parameter.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
