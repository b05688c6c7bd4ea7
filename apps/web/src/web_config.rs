use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use authsweep_core::AppError;
use authsweep_infrastructure::FirebaseAuthConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub web_host: String,
    pub web_port: u16,
    pub directory: FirebaseAuthConfig,
}

impl WebConfig {
    pub async fn load() -> Result<Self, AppError> {
        let web_host = env::var("WEB_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let web_port = match env::var("WEB_PORT") {
            Ok(value) => value.parse::<u16>().map_err(|error| {
                AppError::Validation(format!("invalid WEB_PORT value '{value}': {error}"))
            })?,
            Err(_) => 3001,
        };

        Ok(Self {
            web_host,
            web_port,
            directory: FirebaseAuthConfig::from_env().await?,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.web_host).map_err(|error| {
            AppError::Validation(format!("invalid WEB_HOST '{}': {error}", self.web_host))
        })?;
        Ok(SocketAddr::from((host, self.web_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
