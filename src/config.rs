use crate::error::{
    BadEnvVarSnafu, GradRegError, GradRegResult, ParseEnvVarSnafu, ParsePortSnafu, ZeroEnvVarSnafu,
};
use dotenvy::var;
use secrecy::{ExposeSecret, SecretString};
use snafu::{ResultExt, ensure};
use std::{env::VarError, sync::Arc};

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<DbConfig>,
    app_config: Arc<AppConfig>,
}

impl RuntimeConfiguration {
    pub fn new() -> GradRegResult<Self> {
        Ok(Self {
            db_config: Arc::new(DbConfig::new()?),
            app_config: Arc::new(AppConfig::from_lookup(optional_env_var)?),
        })
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub fn app_config(&self) -> Arc<AppConfig> {
        self.app_config.clone()
    }
}

fn optional_env_var(name: &'static str) -> GradRegResult<Option<String>> {
    match var(name) {
        Ok(value) => Ok(Some(value)),
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
        Err(source) => Err(GradRegError::BadEnvVar { source, name }),
    }
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
}

impl DbConfig {
    pub fn new() -> GradRegResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            path: get_env_var("DB_PATH")?,
            port: get_env_var("DB_PORT")?.parse().context(ParsePortSnafu)?,
            database: get_env_var("DB_NAME")?,
        })
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }
}

/// Everything that isn't about reaching the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server_ip: String,
    /// Stored as `registered_via` on every registration this deployment performs.
    pub channel_tag: String,
    /// How many times a registration transaction is attempted when it hits write conflicts.
    pub transaction_attempts: u32,
    pub max_db_connections: u32,
}

impl AppConfig {
    pub const DEFAULT_SERVER_IP: &'static str = "127.0.0.1:8080";
    pub const DEFAULT_CHANNEL_TAG: &'static str = "web";
    pub const DEFAULT_TRANSACTION_ATTEMPTS: u32 = 5;
    pub const DEFAULT_MAX_DB_CONNECTIONS: u32 = 15;

    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> GradRegResult<Option<String>>,
    ) -> GradRegResult<Self> {
        let positive_number = |name: &'static str, default: u32| -> GradRegResult<u32> {
            let Some(original) = lookup(name)? else {
                return Ok(default);
            };
            let parsed: u32 = original
                .trim()
                .parse()
                .context(ParseEnvVarSnafu { name, original })?;
            ensure!(parsed >= 1, ZeroEnvVarSnafu { name });
            Ok(parsed)
        };

        let channel_tag = lookup("GRADREG_CHANNEL_TAG")?
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_CHANNEL_TAG.to_string());

        Ok(Self {
            server_ip: lookup("GRADREG_SERVER_IP")?
                .unwrap_or_else(|| Self::DEFAULT_SERVER_IP.to_string()),
            channel_tag,
            transaction_attempts: positive_number(
                "GRADREG_TXN_ATTEMPTS",
                Self::DEFAULT_TRANSACTION_ATTEMPTS,
            )?,
            max_db_connections: positive_number(
                "GRADREG_DB_MAX_CONNECTIONS",
                Self::DEFAULT_MAX_DB_CONNECTIONS,
            )?,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_ip: Self::DEFAULT_SERVER_IP.to_string(),
            channel_tag: Self::DEFAULT_CHANNEL_TAG.to_string(),
            transaction_attempts: Self::DEFAULT_TRANSACTION_ATTEMPTS,
            max_db_connections: Self::DEFAULT_MAX_DB_CONNECTIONS,
        }
    }
}
