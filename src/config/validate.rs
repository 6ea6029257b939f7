// src/config/validate.rs

use std::collections::HashSet;
use std::path::{Component, Path};

use crate::config::model::{RawWorkspaceConfig, WorkspaceConfig};
use crate::errors::{CompwatchError, Result};

impl TryFrom<RawWorkspaceConfig> for WorkspaceConfig {
    type Error = CompwatchError;

    fn try_from(raw: RawWorkspaceConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(WorkspaceConfig::new_unchecked(
            raw.extends,
            raw.components,
            raw.watch,
        ))
    }
}

fn validate_raw_config(cfg: &RawWorkspaceConfig) -> Result<()> {
    validate_watch_section(cfg)?;
    validate_rule_roots(cfg)?;
    validate_rule_ids(cfg)?;
    Ok(())
}

fn validate_watch_section(cfg: &RawWorkspaceConfig) -> Result<()> {
    if cfg.watch.debounce_ms == 0 {
        return Err(CompwatchError::ConfigError(
            "watch.debounceMs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_rule_roots(cfg: &RawWorkspaceConfig) -> Result<()> {
    for (index, rule) in cfg.components.iter().enumerate() {
        let root = rule.root.trim();
        if root.is_empty() {
            return Err(CompwatchError::ConfigError(format!(
                "components[{index}] has an empty `root`"
            )));
        }

        let path = Path::new(root);
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if escapes {
            return Err(CompwatchError::ConfigError(format!(
                "components[{index}].root '{root}' must be relative to the workspace and stay inside it"
            )));
        }

        if rule.is_glob() && rule.id.is_some() {
            return Err(CompwatchError::ConfigError(format!(
                "components[{index}].root '{root}' is a glob and cannot carry an explicit `id`"
            )));
        }
    }
    Ok(())
}

fn validate_rule_ids(cfg: &RawWorkspaceConfig) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, rule) in cfg.components.iter().enumerate() {
        let Some(id) = rule.id.as_deref() else {
            continue;
        };
        if id.trim().is_empty() {
            return Err(CompwatchError::ConfigError(format!(
                "components[{index}] has an empty `id`"
            )));
        }
        if !seen.insert(id) {
            return Err(CompwatchError::ConfigError(format!(
                "component id '{id}' is declared more than once"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::loader::parse_config;
    use crate::errors::CompwatchError;

    fn config_error(text: &str) -> String {
        match parse_config(text) {
            Err(CompwatchError::ConfigError(msg)) => msg,
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_debounce() {
        let msg = config_error(r#"{ "watch": { "debounceMs": 0 } }"#);
        assert!(msg.contains("debounceMs"));
    }

    #[test]
    fn rejects_roots_leaving_the_workspace() {
        let msg = config_error(r#"{ "components": [{ "root": "../elsewhere" }] }"#);
        assert!(msg.contains("stay inside"));

        let msg = config_error(r#"{ "components": [{ "root": "/abs/path" }] }"#);
        assert!(msg.contains("stay inside"));
    }

    #[test]
    fn rejects_id_on_glob_root() {
        let msg = config_error(r#"{ "components": [{ "root": "ui/*", "id": "ui" }] }"#);
        assert!(msg.contains("cannot carry an explicit `id`"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let msg = config_error(
            r#"{ "components": [
                { "root": "a", "id": "core" },
                { "root": "b", "id": "core" }
            ] }"#,
        );
        assert!(msg.contains("more than once"));
    }

    #[test]
    fn rejects_empty_root() {
        let msg = config_error(r#"{ "components": [{ "root": "  " }] }"#);
        assert!(msg.contains("empty `root`"));
    }
}
