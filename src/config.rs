use std::env;
use std::net::SocketAddr;

use dotenv::dotenv;

/// Process configuration, loaded once in `main` and passed down explicitly
///
/// Loads a `.env` file from the working directory when present.
/// `DATABASE_URL` must be set; everything else has a default.
#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub bind_addr: SocketAddr,
	pub smtp: SmtpConfig,
}

/// SMTP relay settings for outbound notification mail
#[derive(Debug, Clone)]
pub struct SmtpConfig {
	pub server: String,
	pub port: u16,
	pub username: String,
	pub password: String,
	pub from_email: String,
}

impl Config {
	pub fn from_env() -> Result<Config, String> {
		dotenv().ok();

		let database_url = env::var("DATABASE_URL")
			.map_err(|_| "DATABASE_URL must be set".to_string())?;

		let bind_addr = env::var("BIND_ADDR")
			.unwrap_or_else(|_| "127.0.0.1:8000".to_string())
			.parse::<SocketAddr>()
			.map_err(|e| format!("invalid BIND_ADDR: {}", e))?;

		let port = env::var("SMTP_PORT")
			.unwrap_or_else(|_| "587".to_string())
			.parse::<u16>()
			.map_err(|e| format!("invalid SMTP_PORT: {}", e))?;

		Ok(Config {
			database_url,
			bind_addr,
			smtp: SmtpConfig {
				server: env::var("SMTP_SERVER").unwrap_or_else(|_| "localhost".to_string()),
				port,
				username: env::var("SMTP_USERNAME").unwrap_or_default(),
				password: env::var("SMTP_PASSWORD").unwrap_or_default(),
				from_email: env::var("SMTP_FROM")
					.unwrap_or_else(|_| "noreply@estatelink.example".to_string()),
			},
		})
	}
}
