use crate::auth::{Role, UserCredentials};
use std::env;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name} value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// SQLite file path, or `:memory:`.
    pub database_url: String,
    pub admin: UserCredentials,
    pub user: UserCredentials,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 3000,
            database_url: "tasks.db".to_string(),
            admin: UserCredentials {
                username: "admin".to_string(),
                password: "adminpass".to_string(),
                role: Role::Admin,
            },
            user: UserCredentials {
                username: "user".to_string(),
                password: "userpass".to_string(),
                role: Role::User,
            },
        }
    }
}

impl Config {
    /// Reads the environment (and `.env`, if present) over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = parse("HOST", host)?;
        }
        if let Some(port) = lookup("PORT") {
            config.port = parse("PORT", port)?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        override_credentials(&mut config.admin, &lookup, "ADMIN");
        override_credentials(&mut config.user, &lookup, "USER");

        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn users(&self) -> Vec<UserCredentials> {
        vec![self.admin.clone(), self.user.clone()]
    }
}

fn parse<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}

fn override_credentials(
    credentials: &mut UserCredentials,
    lookup: &impl Fn(&str) -> Option<String>,
    prefix: &str,
) {
    if let Some(username) = lookup(&format!("{prefix}_USERNAME")) {
        credentials.username = username;
    }
    if let Some(password) = lookup(&format!("{prefix}_PASSWORD")) {
        credentials.password = password;
    }
}
