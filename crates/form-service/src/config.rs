use form_rules::DEFAULT_FORM_NAME;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Service settings; every field has a default so partial documents load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name given to forms created without one.
    pub default_form_name: String,
    /// Forward attachment answers to the record writer.
    pub write_attachments: bool,
    /// Prefix of record ids issued by the in-memory record writer.
    pub record_id_prefix: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_form_name: DEFAULT_FORM_NAME.to_string(),
            write_attachments: false,
            record_id_prefix: "rec".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Parses a JSON config; blank input yields the defaults.
    pub fn from_json(config_json: &str) -> Result<Self, ServiceError> {
        if config_json.trim().is_empty() {
            Ok(Self::default())
        } else {
            serde_json::from_str(config_json).map_err(ServiceError::Config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_config_uses_defaults() {
        assert_eq!(ServiceConfig::from_json("  ").unwrap(), ServiceConfig::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = ServiceConfig::from_json(r#"{ "write_attachments": true }"#).unwrap();
        assert!(config.write_attachments);
        assert_eq!(config.default_form_name, "Untitled Form");
    }

    #[test]
    fn malformed_config_is_reported() {
        let err = ServiceConfig::from_json("{").unwrap_err();
        assert_eq!(err.code(), "invalid_config");
    }
}
