//! Deployment configuration.
//!
//! Loaded once at the boundary (env vars or a TOML file), validated, then
//! passed by value into synthesis. Nothing downstream reads ambient state.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Recognized environment keys.
pub const ENV_REGION: &str = "REGION";
pub const ENV_ACCOUNT_ID: &str = "ACCOUNT_ID";
pub const ENV_DOMAIN_NAME: &str = "DOMAIN_NAME";

/// SSH ingress policy for the node security group.
///
/// Open-to-all ingress is deliberately not representable; the relay
/// restriction is the tightest published source we can pin to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SshPolicy {
    /// Port 22 open only to the provider's SSH-relay IP ranges.
    #[default]
    RelayRestricted,
    /// No SSH ingress at all.
    Disabled,
}

/// Validated deployment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Provider region identifier, e.g. `eu-west-1`. Required.
    pub region: String,
    /// Provider account identifier. Optional; only affects resource naming.
    pub account_id: Option<String>,
    /// Public domain name served by the node, if any.
    pub domain_name: Option<String>,
    /// Prefix for deterministic resource names.
    #[serde(default = "default_stack_name")]
    pub stack_name: String,
    /// SSH ingress policy.
    #[serde(default)]
    pub ssh: SshPolicy,
    /// Data directory mounted into the service container on each node.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_stack_name() -> String {
    "ledgerstack".to_string()
}

fn default_data_dir() -> String {
    "/home/ec2-user/data".to_string()
}

impl Config {
    /// Build a config from explicit key/value pairs.
    ///
    /// This is the pure core of [`Config::from_env`]; tests feed it a map
    /// instead of mutating process environment.
    pub fn from_env_map(vars: &HashMap<String, String>) -> ConfigResult<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let config = Config {
            region: get(ENV_REGION).ok_or(ConfigError::MissingRegion)?,
            account_id: get(ENV_ACCOUNT_ID),
            domain_name: get(ENV_DOMAIN_NAME),
            stack_name: default_stack_name(),
            ssh: SshPolicy::default(),
            data_dir: default_data_dir(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_env_map(&vars)
    }

    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field shapes. Called by every constructor.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.region.is_empty() {
            return Err(ConfigError::MissingRegion);
        }
        if !is_region_like(&self.region) {
            return Err(ConfigError::InvalidRegion(self.region.clone()));
        }
        if !is_name_like(&self.stack_name) {
            return Err(ConfigError::InvalidStackName(self.stack_name.clone()));
        }
        Ok(())
    }
}

/// Loose region shape check: `eu-west-1`, `us-east-2`, `ap-southeast-1`.
fn is_region_like(s: &str) -> bool {
    let mut parts = s.split('-');
    let Some(first) = parts.next() else {
        return false;
    };
    let mut rest = 0;
    let mut last = first;
    for part in parts {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
            return false;
        }
        rest += 1;
        last = part;
    }
    first.len() >= 2
        && first.chars().all(|c| c.is_ascii_lowercase())
        && rest >= 2
        && last.chars().all(|c| c.is_ascii_digit())
}

/// Resource-name shape: lowercase alphanumeric and dashes, starts with a letter.
fn is_name_like(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !s.ends_with('-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_env_map_region_only() {
        let config = Config::from_env_map(&env(&[("REGION", "eu-west-1")])).unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.account_id, None);
        assert_eq!(config.domain_name, None);
        assert_eq!(config.ssh, SshPolicy::RelayRestricted);
    }

    #[test]
    fn test_missing_region_fails() {
        let err = Config::from_env_map(&env(&[("DOMAIN_NAME", "budget.example.com")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRegion));
    }

    #[test]
    fn test_blank_region_fails() {
        let err = Config::from_env_map(&env(&[("REGION", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRegion));
    }

    #[test]
    fn test_invalid_region_fails() {
        let err = Config::from_env_map(&env(&[("REGION", "Frankfurt")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegion(_)));
    }

    #[test]
    fn test_optional_keys_picked_up() {
        let config = Config::from_env_map(&env(&[
            ("REGION", "us-east-2"),
            ("ACCOUNT_ID", "123456789012"),
            ("DOMAIN_NAME", "budget.example.com"),
        ]))
        .unwrap();
        assert_eq!(config.account_id.as_deref(), Some("123456789012"));
        assert_eq!(config.domain_name.as_deref(), Some("budget.example.com"));
    }

    #[test]
    fn test_parse_toml_minimal() {
        let config: Config = toml::from_str(r#"region = "eu-west-1""#).unwrap();
        assert_eq!(config.stack_name, "ledgerstack");
        assert_eq!(config.data_dir, "/home/ec2-user/data");
    }

    #[test]
    fn test_parse_toml_ssh_disabled() {
        let config: Config = toml::from_str(
            r#"
region = "eu-west-1"
ssh = "disabled"
"#,
        )
        .unwrap();
        assert_eq!(config.ssh, SshPolicy::Disabled);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledgerstack.toml");
        std::fs::write(&path, "region = \"ap-southeast-1\"\nstack_name = \"budget\"\n")
            .unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.region, "ap-southeast-1");
        assert_eq!(config.stack_name, "budget");
    }

    #[test]
    fn test_from_file_rejects_bad_stack_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledgerstack.toml");
        std::fs::write(&path, "region = \"eu-west-1\"\nstack_name = \"My Stack\"\n")
            .unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStackName(_)));
    }
}
