use super::types::*;
use crate::config::{expand_env_vars, expand_tilde};
use regex::Regex;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(e) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        )),
        other => other,
    })
}

/// Load the config at `path`, or fall back to built-in defaults when no
/// config file was found.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            tracing::info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Parse and validate a YAML config document.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml)?;

    // An empty document means "all defaults".
    let mut config: Config = if yaml.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&yaml)?
    };

    config.storage.data_dir = expand_tilde(&config.storage.data_dir);

    validate_config(&config)?;
    Ok(config)
}

fn check_unexpanded_vars(yaml: &str) -> Result<(), ConfigError> {
    let re = Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
    let mut unexpanded: Vec<String> = re
        .captures_iter(yaml)
        .map(|cap| cap[1].to_string())
        .collect();

    if unexpanded.is_empty() {
        return Ok(());
    }

    unexpanded.sort();
    unexpanded.dedup();

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}\n\
         Set them before starting, or replace the $env{{...}} references in the config file",
        unexpanded.join(", ")
    )))
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if !is_host_port(&config.server.listen) {
        errors.push(format!(
            "server.listen: '{}' is not a valid listen address (expected host:port)",
            config.server.listen
        ));
    }

    if config.server.max_body_bytes == 0 {
        errors.push("server.max_body_bytes must be greater than zero".to_string());
    }

    if config.storage.data_dir.as_os_str().is_empty() {
        errors.push("storage.data_dir cannot be empty".to_string());
    }

    let file_name = &config.storage.file_name;
    if file_name.is_empty() {
        errors.push("storage.file_name cannot be empty".to_string());
    } else if file_name.contains('/') || file_name.contains('\\') || file_name == "." || file_name == ".." {
        errors.push(format!(
            "storage.file_name: '{}' must be a plain file name, not a path",
            file_name
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

/// Accepts `host:port` with a hostname or an IP. The host is resolved at bind time.
fn is_host_port(addr: &str) -> bool {
    if addr.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match addr.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && !host.contains(':')
                && !host.chars().any(char::is_whitespace)
                && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_empty_document_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.storage.log_path(), PathBuf::from("data/events.log"));
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
server:
  listen: "127.0.0.1:18080"
  max_body_bytes: 4096
storage:
  data_dir: /var/lib/streamhub
  file_name: watch.log
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:18080");
        assert_eq!(config.server.max_body_bytes, 4096);
        assert_eq!(
            config.storage.log_path(),
            PathBuf::from("/var/lib/streamhub/watch.log")
        );
    }

    #[test]
    fn test_env_var_expansion_in_data_dir() {
        std::env::set_var("STREAMHUB_PARSE_TEST_DIR", "/srv/ingest");
        let config = parse_config("storage:\n  data_dir: $env{STREAMHUB_PARSE_TEST_DIR}/data\n").unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/srv/ingest/data"));
        std::env::remove_var("STREAMHUB_PARSE_TEST_DIR");
    }

    #[test]
    fn test_unset_env_var_is_an_error() {
        let err = parse_config("storage:\n  data_dir: $env{STREAMHUB_SURELY_UNSET}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("STREAMHUB_SURELY_UNSET"));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let yaml = r#"
server:
  listen: not-an-address
  max_body_bytes: 0
storage:
  file_name: nested/events.log
"#;
        match parse_config(yaml).unwrap_err() {
            ConfigError::ValidationList(errors) => {
                assert_eq!(errors.len(), 3);
                assert!(errors[0].contains("server.listen"));
                assert!(errors[1].contains("max_body_bytes"));
                assert!(errors[2].contains("plain file name"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_listen_accepts_hostnames() {
        for listen in ["localhost:8080", "ingest.internal:80", "[::1]:8080", "0.0.0.0:0"] {
            let yaml = format!("server:\n  listen: \"{listen}\"\n");
            let config = parse_config(&yaml).unwrap();
            assert_eq!(config.server.listen, listen);
        }
    }

    #[test]
    fn test_listen_rejects_malformed_addresses() {
        for listen in ["localhost", ":8080", "localhost:http", "localhost:70000", "::1:8080", "my host:80"] {
            let yaml = format!("server:\n  listen: \"{listen}\"\n");
            assert!(
                matches!(parse_config(&yaml), Err(ConfigError::ValidationList(_))),
                "{listen} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_yaml() {
        let err = parse_config("server: [unterminated").unwrap_err();
        assert!(matches!(err, ConfigError::YamlParse(_)));
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = load_or_default(None).unwrap();
        assert_eq!(config.storage.file_name, "events.log");
    }

    #[test]
    fn test_load_missing_file_mentions_path() {
        let err = load_config(Path::new("/nonexistent/streamhub.yml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/streamhub.yml"));
    }
}
