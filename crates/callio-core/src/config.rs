use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::ChannelProfile;
use crate::errors::CallioError;

/// Product selector controlling the engine channel profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Product {
    #[default]
    Rtc,
    Ils,
}

/// Session-scoped configuration.
///
/// Loaded once at startup, then owned by a single `SessionManager`.
/// The token-fetch step updates `token` and `channel_name` on success;
/// those are the values the subsequent join uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub uid: u32,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,
    #[serde(default)]
    pub product: Product,
}

fn default_token_expiry() -> u64 {
    3600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            channel_name: String::new(),
            uid: 0,
            token: None,
            server_url: None,
            token_expiry_secs: default_token_expiry(),
            product: Product::Rtc,
        }
    }
}

impl SessionConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults; a present but unreadable or
    /// malformed file is a configuration error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CallioError> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| CallioError::Config(format!("invalid config file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(CallioError::Config(format!("cannot read config file: {e}"))),
        }
    }

    /// Channel profile for the configured product. Every product except
    /// ILS runs the live-broadcasting profile.
    pub fn channel_profile(&self) -> ChannelProfile {
        match self.product {
            Product::Ils => ChannelProfile::Communication,
            Product::Rtc => ChannelProfile::LiveBroadcasting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert!(config.app_id.is_empty());
        assert_eq!(config.uid, 0);
        assert_eq!(config.token_expiry_secs, 3600);
        assert_eq!(config.product, Product::Rtc);
        assert_eq!(config.channel_profile(), ChannelProfile::LiveBroadcasting);
    }

    #[test]
    fn ils_product_selects_communication_profile() {
        let config = SessionConfig {
            product: Product::Ils,
            ..Default::default()
        };
        assert_eq!(config.channel_profile(), ChannelProfile::Communication);
    }

    #[test]
    fn from_file_missing_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::from_file(dir.path().join("config.json")).unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn from_file_parses_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"app_id":"app-1","channel_name":"main","uid":7,"product":"ILS"}"#,
        )
        .unwrap();

        let config = SessionConfig::from_file(&path).unwrap();
        assert_eq!(config.app_id, "app-1");
        assert_eq!(config.channel_name, "main");
        assert_eq!(config.uid, 7);
        assert_eq!(config.product, Product::Ils);
        assert_eq!(config.token, None);
        assert_eq!(config.token_expiry_secs, 3600);
    }

    #[test]
    fn from_file_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json!!!").unwrap();

        let err = SessionConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CallioError::Config(_)));
    }
}
