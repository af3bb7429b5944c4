use std::collections::HashSet;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub admin: AdminSettings,
    #[serde(default)]
    pub password: PasswordSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Access token signing settings
///
/// `signing_secret` is optional at deserialization time so that a missing
/// secret surfaces as a `ConfigError` when the signer is built, not as an
/// opaque parse failure.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub signing_secret: Option<String>,
    pub issuer: String,
    pub audience: String,
}

/// Emails granted the Admin role at registration
#[derive(serde::Deserialize, Clone, Default)]
pub struct AdminSettings {
    #[serde(default)]
    pub email_allow_list: Vec<String>,
}

impl AdminSettings {
    pub fn allow_list(&self) -> HashSet<String> {
        self.email_allow_list.iter().cloned().collect()
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct PasswordSettings {
    /// bcrypt work factor
    pub hash_cost: u32,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Reads `configuration.{yaml,toml,json}` from the working directory, then
/// lets `APP_*` environment variables override it (`APP_JWT__SIGNING_SECRET`).
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("admin.email_allow_list")
                .try_parsing(true),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
