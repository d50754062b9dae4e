use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use agentdesk_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;
use toml::Value;

use crate::commands::{to_data, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let config_file_path = options
        .config_path
        .clone()
        .filter(|path| path.exists())
        .or_else(detect_config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key: &str, env_key: &str| {
        field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let auth_token = config
        .api
        .auth_token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    let entries = vec![
        ConfigEntry {
            key: "api.base_url",
            value: config.api.base_url.clone(),
            source: source("api.base_url", "AGENTDESK_API_BASE_URL"),
        },
        ConfigEntry {
            key: "api.timeout_secs",
            value: config.api.timeout_secs.to_string(),
            source: source("api.timeout_secs", "AGENTDESK_API_TIMEOUT_SECS"),
        },
        ConfigEntry {
            key: "api.auth_token",
            value: auth_token,
            source: source("api.auth_token", "AGENTDESK_API_AUTH_TOKEN"),
        },
        ConfigEntry {
            key: "session.company_id",
            value: config.session.company_id.clone().unwrap_or_else(|| "<unset>".to_string()),
            source: source("session.company_id", "AGENTDESK_SESSION_COMPANY_ID"),
        },
        ConfigEntry {
            key: "logging.level",
            value: config.logging.level.clone(),
            source: source("logging.level", "AGENTDESK_LOGGING_LEVEL"),
        },
        ConfigEntry {
            key: "logging.format",
            value: config.logging.format.as_str().to_string(),
            source: source("logging.format", "AGENTDESK_LOGGING_FORMAT"),
        },
    ];

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: override > env > file > default)",
        to_data(&entries),
    )
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("agentdesk.toml"), PathBuf::from("config/agentdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Keeps at most the first four characters of a token.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }

    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_token};

    #[test]
    fn tokens_are_redacted() {
        assert_eq!(redact_token("  "), "<empty>");
        assert_eq!(redact_token("short"), "<redacted>");
        assert_eq!(redact_token("sk-live-1234567890"), "sk-l***");
    }

    #[test]
    fn nested_keys_are_found_in_the_config_document() {
        let doc: toml::Value = "[api]\nbase_url = \"https://x.test\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "api.base_url"));
        assert!(!contains_path(&doc, "api.timeout_secs"));
    }
}
