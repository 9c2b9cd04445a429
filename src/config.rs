use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    pub backend: BackendConfig,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Token operators must present to log in. When unset the console
    /// starts authenticated and login accepts any token.
    #[serde(default)]
    pub operator_token: Option<String>,
}

fn default_listen_port() -> u16 {
    9090
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self, ConfigError> {
        let mut cfg: Config = serde_yaml::from_str(data)?;

        cfg.backend.base_url = cfg.backend.base_url.trim_end_matches('/').to_string();
        if cfg.backend.base_url.is_empty() {
            return Err(ConfigError::Invalid("backend.base_url must be set".into()));
        }
        if reqwest::Url::parse(&cfg.backend.base_url).is_err() {
            return Err(ConfigError::Invalid(format!(
                "backend.base_url {:?} is not a valid URL",
                cfg.backend.base_url
            )));
        }
        if cfg.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("poll_interval_secs must be > 0".into()));
        }
        if cfg.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be > 0".into()));
        }

        Ok(cfg)
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.listen_port)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_minimal_config() {
        let cfg = Config::parse("backend:\n  base_url: http://ops:3000/\n").unwrap();
        assert_eq!(cfg.listen_port, 9090);
        assert_eq!(cfg.backend.base_url, "http://ops:3000");
        assert_eq!(cfg.poll_interval(), Duration::from_secs(30));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert!(cfg.session.operator_token.is_none());
        assert_eq!(cfg.listen_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = Config::parse(
            "listen_port: 8080\n\
             backend:\n  base_url: https://ops.internal\n\
             poll_interval_secs: 5\n\
             request_timeout_secs: 2\n\
             session:\n  operator_token: s3cret\n",
        )
        .unwrap();
        assert_eq!(cfg.listen_port, 8080);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(2));
        assert_eq!(cfg.session.operator_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn missing_backend_is_a_parse_error() {
        assert!(matches!(
            Config::parse("listen_port: 1\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = Config::parse("backend:\n  base_url: http://ops\npoll_interval_secs: 0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_url_is_rejected() {
        let err = Config::parse("backend:\n  base_url: not a url\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
