use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub shell: ShellConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

/// Programs used to execute commands as the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    pub su_program: String,
    pub sudo_program: String,
    pub getent_program: String,
    /// Unprivileged account that launches the `su` login check when the
    /// service itself runs as root
    pub verify_launcher: String,
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub enable_audit_logging: bool,
    pub credential_schemes: CredentialSchemes,
}

/// Which transport bindings the credential extractor accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSchemes {
    /// `username` + base64 `password` headers
    pub header_pair: bool,
    /// `Authorization: Basic ...`
    pub basic: bool,
}

impl Default for CredentialSchemes {
    fn default() -> Self {
        Self {
            header_pair: true,
            basic: true,
        }
    }
}

impl ShellConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("SERVER_BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Some(port) = env::var("HOST_ADMIN_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Shell overrides
        if let Ok(v) = env::var("SHELL_SU_PROGRAM") {
            self.shell.su_program = v;
        }
        if let Ok(v) = env::var("SHELL_SUDO_PROGRAM") {
            self.shell.sudo_program = v;
        }
        if let Ok(v) = env::var("SHELL_GETENT_PROGRAM") {
            self.shell.getent_program = v;
        }
        if let Ok(v) = env::var("SHELL_VERIFY_LAUNCHER") {
            self.shell.verify_launcher = v;
        }
        if let Ok(v) = env::var("SHELL_COMMAND_TIMEOUT_SECS") {
            self.shell.command_timeout_secs = v.parse().unwrap_or(self.shell.command_timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }
        if let Ok(v) = env::var("SECURITY_ACCEPT_HEADER_PAIR") {
            self.security.credential_schemes.header_pair =
                v.parse().unwrap_or(self.security.credential_schemes.header_pair);
        }
        if let Ok(v) = env::var("SECURITY_ACCEPT_BASIC_AUTH") {
            self.security.credential_schemes.basic =
                v.parse().unwrap_or(self.security.credential_schemes.basic);
        }

        self
    }

    fn shell_defaults(command_timeout_secs: u64) -> ShellConfig {
        ShellConfig {
            su_program: "su".to_string(),
            sudo_program: "sudo".to_string(),
            getent_program: "getent".to_string(),
            verify_launcher: "nobody".to_string(),
            command_timeout_secs,
        }
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
            },
            shell: Self::shell_defaults(60),
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                enable_audit_logging: false,
                credential_schemes: CredentialSchemes::default(),
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8000,
            },
            shell: Self::shell_defaults(30),
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                enable_audit_logging: true,
                credential_schemes: CredentialSchemes::default(),
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8000,
            },
            shell: Self::shell_defaults(15),
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 64 * 1024,
            },
            security: SecurityConfig {
                enable_cors: false,
                cors_origins: vec!["https://admin.example.com".to_string()],
                enable_audit_logging: true,
                credential_schemes: CredentialSchemes::default(),
            },
        }
    }
}

// Global singleton config - initialized once at startup, read-only afterwards
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
