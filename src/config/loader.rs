// src/config/loader.rs

use crate::config::model::{RawWorkspaceConfig, WorkspaceConfig};
use crate::errors::Result;

/// Well-known configuration file name at the workspace root.
pub const WORKSPACE_CONFIG_FILE: &str = "workspace.jsonc";

/// Parse and validate configuration text.
///
/// Used by the registry, which reads through its own `FileSystem`.
pub fn parse_config(contents: &str) -> Result<WorkspaceConfig> {
    let raw: RawWorkspaceConfig = serde_json5::from_str(contents)?;
    WorkspaceConfig::try_from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comments_and_trailing_commas() {
        let cfg = parse_config(
            r#"
            {
              // defaults
              "extends": { "ignore": ["*.log",] },
              "components": [
                { "root": "components/*" },
                { "root": "libs/core", "id": "core", "extends": false, },
              ],
              "watch": { "debounceMs": 250 },
            }
            "#,
        )
        .unwrap();

        assert_eq!(cfg.rules().len(), 2);
        assert_eq!(cfg.rules()[1].id.as_deref(), Some("core"));
        assert!(!cfg.rules()[1].extends);
        assert_eq!(cfg.watch().debounce_ms, 250);
        assert_eq!(cfg.watch().ignored_dirs, vec!["node_modules"]);
        assert_eq!(cfg.extends().ignore, vec!["*.log"]);
    }

    #[test]
    fn empty_object_yields_defaults() {
        let cfg = parse_config("{}").unwrap();
        assert!(cfg.rules().is_empty());
        assert_eq!(cfg.watch().debounce_ms, 100);
        assert_eq!(cfg.watch().manifest, "package.json");
    }

    #[test]
    fn malformed_text_is_a_jsonc_error() {
        let err = parse_config("{ components: [ }").unwrap_err();
        assert!(matches!(err, crate::errors::CompwatchError::JsoncError(_)));
    }
}
