use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub tenancy: TenancyConfig,
}

impl AppConfig {
    /// Load configuration from environment variables only
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None, "ROSTER")
    }

    /// Load configuration from a TOML file with environment overrides.
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::build(Some(path), "ROSTER")
    }

    /// Parse configuration from an inline TOML document (no environment overrides)
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let builder = Self::defaults(Config::builder())?
            .add_source(File::from_str(toml, FileFormat::Toml));

        builder.build()?.try_deserialize()
    }

    fn build(path: Option<&Path>, prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = Self::defaults(Config::builder())?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let builder = builder.add_source(
            Environment::with_prefix(prefix)
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 0)?
            .set_default("auth.jwt_secret", "development-secret-change-in-production")?
            .set_default("auth.token_expiry_seconds", 3600)?
            .set_default("auth.issuer", "roster")?
            .set_default("auth.audience", "roster-admin")?
            .set_default("tenancy.default_tenant", "default")?
            .set_default("tenancy.cookie_name", "roster_tenant")
    }
}

/// Pool settings shared by every tenant engine
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub min_connections: u32,
    /// Falls back to the driver default when unset
    #[serde(default)]
    pub acquire_timeout_seconds: Option<u64>,
}

impl DatabaseConfig {
    pub fn new() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: 0,
            acquire_timeout_seconds: None,
        }
    }

    pub fn with_pool_size(mut self, min: u32, max: u32) -> Self {
        self.min_connections = min;
        self.max_connections = max;
        self
    }

    pub fn with_acquire_timeout(mut self, seconds: u64) -> Self {
        self.acquire_timeout_seconds = Some(seconds);
        self
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_max_connections() -> u32 {
    10
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry_seconds")]
    pub token_expiry_seconds: u64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: String) -> Self {
        Self {
            jwt_secret,
            token_expiry_seconds: default_token_expiry_seconds(),
            issuer: default_issuer(),
            audience: default_audience(),
        }
    }

    pub fn with_expiry(mut self, seconds: u64) -> Self {
        self.token_expiry_seconds = seconds;
        self
    }

    pub fn token_expiry(&self) -> Duration {
        Duration::from_secs(self.token_expiry_seconds)
    }
}

fn default_token_expiry_seconds() -> u64 {
    3600 // 1 hour
}

fn default_issuer() -> String {
    "roster".to_string()
}

fn default_audience() -> String {
    "roster-admin".to_string()
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }

    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// The statically configured tenant set
#[derive(Debug, Clone, Deserialize)]
pub struct TenancyConfig {
    pub default_tenant: String,
    /// When set, hostname inference only considers `{tenant}.{base_domain}`
    #[serde(default)]
    pub base_domain: Option<String>,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default)]
    pub tenants: BTreeMap<String, TenantSettings>,
}

impl TenancyConfig {
    pub fn new(default_tenant: &str) -> Self {
        Self {
            default_tenant: default_tenant.to_string(),
            base_domain: None,
            cookie_name: default_cookie_name(),
            tenants: BTreeMap::new(),
        }
    }

    pub fn with_tenant(mut self, key: &str, settings: TenantSettings) -> Self {
        self.tenants.insert(key.to_string(), settings);
        self
    }

    pub fn with_base_domain(mut self, domain: &str) -> Self {
        self.base_domain = Some(domain.to_string());
        self
    }
}

fn default_cookie_name() -> String {
    "roster_tenant".to_string()
}

/// Per-tenant settings
#[derive(Debug, Clone, Deserialize)]
pub struct TenantSettings {
    pub database_url: String,
    pub display_name: String,
    /// Expected dues per period, in cents
    #[serde(default)]
    pub annual_dues_cents: i64,
}

impl TenantSettings {
    pub fn new(database_url: &str, display_name: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            display_name: display_name.to_string(),
            annual_dues_cents: 0,
        }
    }

    pub fn with_annual_dues(mut self, cents: i64) -> Self {
        self.annual_dues_cents = cents;
        self
    }
}
