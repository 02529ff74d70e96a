use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_mins: i64,
    pub refresh_token_ttl_days: i64,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub upload_base_url: String,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment presets first, specific env vars win
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs = v.parse().unwrap_or(self.database.connection_timeout_secs);
        }

        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }

        if let Ok(v) = env::var("ACCESS_TOKEN_SECRET") {
            self.security.access_token_secret = v;
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_SECRET") {
            self.security.refresh_token_secret = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_TTL_MINS") {
            self.security.access_token_ttl_mins = v.parse().unwrap_or(self.security.access_token_ttl_mins);
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_TTL_DAYS") {
            self.security.refresh_token_ttl_days = v.parse().unwrap_or(self.security.refresh_token_ttl_days);
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }

        if let Ok(v) = env::var("MEDIA_UPLOAD_BASE_URL") {
            self.media.upload_base_url = v;
        }
        if let Ok(v) = env::var("MEDIA_REQUEST_TIMEOUT_SECS") {
            self.media.request_timeout_secs = v.parse().unwrap_or(self.media.request_timeout_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            api: ApiConfig {
                default_page_size: 10,
                max_page_size: 100,
            },
            security: SecurityConfig {
                // Development-only defaults, always overridden in real deployments
                access_token_secret: "dev-access-token-secret".to_string(),
                refresh_token_secret: "dev-refresh-token-secret".to_string(),
                access_token_ttl_mins: 60,
                refresh_token_ttl_days: 10,
                secure_cookies: false,
            },
            media: MediaConfig {
                upload_base_url: "http://localhost:9100".to_string(),
                request_timeout_secs: 120,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout_secs: 10,
            },
            api: ApiConfig {
                default_page_size: 10,
                max_page_size: 50,
            },
            security: SecurityConfig {
                access_token_secret: String::new(),
                refresh_token_secret: String::new(),
                access_token_ttl_mins: 30,
                refresh_token_ttl_days: 7,
                secure_cookies: true,
            },
            media: MediaConfig {
                upload_base_url: String::new(),
                request_timeout_secs: 60,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout_secs: 5,
            },
            api: ApiConfig {
                default_page_size: 10,
                max_page_size: 50,
            },
            security: SecurityConfig {
                access_token_secret: String::new(),
                refresh_token_secret: String::new(),
                access_token_ttl_mins: 15,
                refresh_token_ttl_days: 7,
                secure_cookies: true,
            },
            media: MediaConfig {
                upload_base_url: String::new(),
                request_timeout_secs: 60,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_have_usable_secrets() {
        let config = AppConfig::development();
        assert!(!config.security.access_token_secret.is_empty());
        assert!(!config.security.refresh_token_secret.is_empty());
        assert_ne!(
            config.security.access_token_secret,
            config.security.refresh_token_secret
        );
        assert!(!config.security.secure_cookies);
    }

    #[test]
    fn production_defaults_require_configured_secrets() {
        let config = AppConfig::production();
        assert!(config.security.access_token_secret.is_empty());
        assert!(config.security.secure_cookies);
        assert!(config.security.access_token_ttl_mins < config.security.refresh_token_ttl_days * 24 * 60);
    }
}
