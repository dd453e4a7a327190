use anyhow::{Context, Result};
use clap::Parser;
use std::fmt;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Database host
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    /// Database port. Validated when connecting so that a bad value is
    /// reported as a connection failure.
    #[arg(long, env = "DB_PORT", default_value = "5432")]
    pub db_port: String,

    /// Database name
    #[arg(long, env = "DB_NAME", default_value = "mockmate_db")]
    pub db_name: String,

    /// Database user
    #[arg(long, env = "DB_USER", default_value = "mockmate_user")]
    pub db_user: String,

    /// Database password
    #[arg(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    pub db_password: String,

    /// Trailing window, in hours, for the recent questions check
    #[arg(long, env = "QUESTION_WINDOW_HOURS", default_value_t = 24)]
    pub window_hours: u32,

    /// Number of questions listed when none are recent
    #[arg(long, env = "QUESTION_FALLBACK_LIMIT", default_value_t = 10)]
    pub fallback_limit: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub inspect: InspectConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: String,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: "5432".to_string(),
            dbname: "mockmate_db".to_string(),
            user: "mockmate_user".to_string(),
            password: "".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Connection parameters for the client. The session time zone is pinned
    /// to UTC so that timestamps without a zone compare as UTC.
    pub fn to_pg_config(&self) -> Result<tokio_postgres::Config> {
        let port: u16 = self
            .port
            .trim()
            .parse()
            .with_context(|| format!("Invalid DB_PORT value {:?}", self.port))?;

        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.host)
            .port(port)
            .dbname(&self.dbname)
            .user(&self.user)
            .application_name(env!("CARGO_PKG_NAME"))
            .options("-c TimeZone=UTC");
        if !self.password.is_empty() {
            pg.password(&self.password);
        }
        Ok(pg)
    }
}

/// Never shows the password.
impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectConfig {
    pub window_hours: u32,
    pub fallback_limit: u32,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            window_hours: 24,
            fallback_limit: 10,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            database: DatabaseConfig {
                host: args.db_host,
                port: args.db_port,
                dbname: args.db_name,
                user: args.db_user,
                password: args.db_password,
            },
            inspect: InspectConfig {
                window_hours: args.window_hours,
                fallback_limit: args.fallback_limit,
            },
        }
    }
}
