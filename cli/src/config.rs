//! YAML configuration loading
//!
//! The configuration file maps an MLS key to connection settings and
//! resource aliases:
//!
//! ```yaml
//! somemls:
//!   login_url: https://rets.example.com/login
//!   username: u
//!   password: p
//!   resources:
//!     listings:
//!       resource: Property
//!       classes: [Residential, Commercial]
//! ```
//!
//! Loaded from `retsq.yaml` in the working directory, or the path in
//! `RETSQ_CONFIG`.

use retsq_client::SessionProfile;
use retsq_shared::error::{Error, Result};
use retsq_shared::ResourceClassTarget;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "retsq.yaml";
const CONFIG_PATH_ENV: &str = "RETSQ_CONFIG";

/// Connection and resource configuration for one MLS.
#[derive(Debug, Clone, Deserialize)]
pub struct MlsConfig {
    pub login_url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub user_agent_password: Option<String>,
    #[serde(default)]
    pub rets_version: Option<String>,
    #[serde(default)]
    pub use_post_method: bool,
    #[serde(default)]
    pub http_authentication_method: Option<String>,
    #[serde(default)]
    pub standard_names: bool,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceAlias>,
}

/// One alias entry: a resource, its classes, and optional media settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceAlias {
    pub resource: String,
    pub classes: Vec<String>,
    #[serde(default)]
    pub object: Option<ObjectSpec>,
}

/// Media-object defaults for `objectquery`.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectSpec {
    pub field: String,
    #[serde(default)]
    pub by_location: bool,
}

impl MlsConfig {
    /// Connection settings for the session builder.
    pub fn session_profile(&self) -> Result<SessionProfile> {
        SessionProfile::builder(&self.login_url, &self.username, &self.password)
            .user_agent(self.user_agent.clone())
            .user_agent_password(self.user_agent_password.clone())
            .rets_version(self.rets_version.clone())
            .use_post_method(self.use_post_method)
            .http_authentication_method(self.http_authentication_method.clone())
            .build()
    }

    /// Resolve the resource/class target: explicit overrides win, the
    /// alias supplies the rest. Override validation (both-or-neither) has
    /// already happened in the CLI layer.
    pub fn target(
        &self,
        alias: &str,
        resource_override: Option<&str>,
        class_override: Option<&str>,
    ) -> Result<ResourceClassTarget> {
        if let (Some(resource), Some(class)) = (resource_override, class_override) {
            return Ok(ResourceClassTarget::single(resource, class));
        }
        let entry = self.alias(alias)?;
        Ok(ResourceClassTarget::new(
            entry.resource.clone(),
            entry.classes.clone(),
        ))
    }

    pub fn alias(&self, alias: &str) -> Result<&ResourceAlias> {
        self.resources.get(alias).ok_or_else(|| {
            Error::Configuration(format!("unknown resource alias '{}'", alias))
        })
    }
}

/// The full configuration file: MLS key -> [`MlsConfig`].
#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    #[serde(flatten)]
    entries: BTreeMap<String, MlsConfig>,
}

impl Configuration {
    /// Load from `RETSQ_CONFIG` or `./retsq.yaml`.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE_NAME));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| Error::Configuration(format!("invalid configuration: {}", e)))
    }

    pub fn by_key(&self, key: &str) -> Result<&MlsConfig> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::Configuration(format!("unknown configuration key '{}'", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
somemls:
  login_url: https://rets.example.com/login
  username: user
  password: pass
  rets_version: RETS/1.7.2
  standard_names: true
  resources:
    listings:
      resource: Property
      classes: [Residential, Commercial]
      object:
        field: Photo
        by_location: true
"#;

    #[test]
    fn test_parse_and_lookup() {
        let config = Configuration::parse(SAMPLE).unwrap();
        let mls = config.by_key("somemls").unwrap();
        assert_eq!(mls.login_url, "https://rets.example.com/login");
        assert!(mls.standard_names);
        let alias = mls.alias("listings").unwrap();
        assert_eq!(alias.resource, "Property");
        assert_eq!(alias.classes.len(), 2);
        assert!(alias.object.as_ref().unwrap().by_location);
    }

    #[test]
    fn test_unknown_key_is_a_configuration_error() {
        let config = Configuration::parse(SAMPLE).unwrap();
        assert!(matches!(
            config.by_key("othermls"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_unknown_alias_is_a_configuration_error() {
        let config = Configuration::parse(SAMPLE).unwrap();
        let mls = config.by_key("somemls").unwrap();
        assert!(matches!(
            mls.target("rooms", None, None),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_overrides_replace_the_alias() {
        let config = Configuration::parse(SAMPLE).unwrap();
        let mls = config.by_key("somemls").unwrap();
        let target = mls
            .target("listings", Some("Office"), Some("Commercial"))
            .unwrap();
        assert_eq!(target.resource, "Office");
        assert_eq!(target.classes, vec!["Commercial".to_string()]);
    }

    #[test]
    fn test_missing_required_field_fails() {
        let broken = "somemls:\n  login_url: https://x\n  username: u\n";
        assert!(Configuration::parse(broken).is_err());
    }

    #[test]
    fn test_session_profile_from_config() {
        let config = Configuration::parse(SAMPLE).unwrap();
        let profile = config.by_key("somemls").unwrap().session_profile().unwrap();
        assert_eq!(profile.rets_version(), "RETS/1.7.2");
        assert!(!profile.use_post_method);
    }
}
