//! Command line and environment configuration for the server.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use time::Duration;

/// Where the server is running, which decides how much error detail clients see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    /// Unexpected errors include their detail in the response body.
    Development,
    /// Unexpected errors only carry a generic message.
    Production,
}

/// The REST API server for recording commodity sales.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Connection string for the SQLite database, e.g. `sqlite://ledger.db`.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Secret used to sign and verify credentials.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory containing an SSL certificate `cert.pem` and key `key.pem`.
    ///
    /// The server uses plain HTTP when this is not set.
    #[arg(long, env = "CERT_PATH")]
    pub cert_path: Option<PathBuf>,

    /// The origin of the web client that may call the API with credentials.
    #[arg(long, env = "CLIENT_ORIGIN", default_value = "http://localhost:5173")]
    pub client_origin: String,

    /// The environment the server runs in.
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = Environment::Production)]
    pub environment: Environment,

    /// How many hours an issued credential stays valid.
    #[arg(long, env = "TOKEN_DURATION_HOURS", default_value_t = 24)]
    pub token_duration_hours: u16,
}

impl Config {
    /// How long an issued credential stays valid.
    pub fn token_duration(&self) -> Duration {
        Duration::hours(i64::from(self.token_duration_hours))
    }

    /// Whether clients should see the detail of unexpected errors.
    pub fn expose_error_details(&self) -> bool {
        self.environment == Environment::Development
    }
}
