use log::info;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub workers: usize,
    pub api_url: String,
    pub public_url: String,
    pub request_timeout: Duration,
    pub session_ttl: chrono::Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "127.0.0.1".to_owned(),
            port: 8888,
            workers: num_cpus::get(),
            api_url: "http://localhost:443".to_owned(),
            public_url: "http://localhost:8888".to_owned(),
            request_timeout: Duration::from_secs(10),
            session_ttl: chrono::Duration::minutes(60),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenv::dotenv().ok();
        let defaults = Config::default();
        Ok(Config {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: try_load("PORT", defaults.port)?,
            workers: try_load("WORKERS", defaults.workers)?,
            api_url: env::var("POLL_API_URL").unwrap_or(defaults.api_url),
            public_url: env::var("PUBLIC_URL").unwrap_or(defaults.public_url),
            request_timeout: Duration::from_secs(try_load(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            session_ttl: chrono::Duration::minutes(try_load(
                "SESSION_TTL_MINUTES",
                defaults.session_ttl.num_minutes(),
            )?),
        })
    }

    pub fn share_link(&self, poll_id: &str) -> String {
        format!("{}/poll/{}", self.public_url.trim_end_matches('/'), poll_id)
    }
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
        Err(_) => {
            info!("{} not set, using default: {}", key, default);
            Ok(default)
        }
    }
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    fn share_link_joins_public_url() {
        let config = Config {
            public_url: "https://polls.example.com/".to_owned(),
            ..Config::default()
        };
        assert_eq!(
            config.share_link("42"),
            "https://polls.example.com/poll/42"
        );
    }
}
