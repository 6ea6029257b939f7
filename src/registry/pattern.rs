// src/registry/pattern.rs

//! Component id pattern syntax.
//!
//! - `is:a,b`        exact id membership
//! - `glob:expr,...` glob match against the id
//! - `reg:expr,...`  regex match against the id
//! - `a,b*,c`        OR of bare tokens: a token containing `*` is a glob,
//!                   anything else is a substring test

use std::str::FromStr;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::errors::CompwatchError;

#[derive(Debug, Clone)]
pub enum ComponentPattern {
    Exact(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
    Tokens(Vec<Token>),
}

#[derive(Debug, Clone)]
pub enum Token {
    Glob(GlobMatcher),
    Contains(String),
}

impl ComponentPattern {
    pub fn matches(&self, id: &str) -> bool {
        match self {
            ComponentPattern::Exact(ids) => ids.iter().any(|candidate| candidate == id),
            ComponentPattern::Glob(globs) => globs.iter().any(|g| g.is_match(id)),
            ComponentPattern::Regex(res) => res.iter().any(|re| re.is_match(id)),
            ComponentPattern::Tokens(tokens) => tokens.iter().any(|t| match t {
                Token::Glob(g) => g.is_match(id),
                Token::Contains(s) => id.contains(s.as_str()),
            }),
        }
    }

    /// Keep the ids that match, preserving their input order.
    pub fn filter<'a, I>(&self, ids: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter().filter(|id| self.matches(id)).collect()
    }
}

impl FromStr for ComponentPattern {
    type Err = CompwatchError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        let (prefix, body) = match pattern.split_once(':') {
            Some((p @ ("is" | "glob" | "reg"), rest)) => (Some(p), rest),
            _ => (None, pattern),
        };

        let parts: Vec<&str> = body
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            return Err(invalid(pattern, "pattern has no terms"));
        }

        let parsed = match prefix {
            Some("is") => {
                ComponentPattern::Exact(parts.iter().map(|s| s.to_string()).collect())
            }
            Some("glob") => ComponentPattern::Glob(
                parts
                    .iter()
                    .map(|p| compile_glob(pattern, p))
                    .collect::<Result<_, _>>()?,
            ),
            Some("reg") => ComponentPattern::Regex(
                parts
                    .iter()
                    .map(|p| Regex::new(p).map_err(|e| invalid(pattern, e)))
                    .collect::<Result<_, _>>()?,
            ),
            _ => ComponentPattern::Tokens(
                parts
                    .iter()
                    .map(|p| {
                        if p.contains('*') {
                            compile_glob(pattern, p).map(Token::Glob)
                        } else {
                            Ok(Token::Contains(p.to_string()))
                        }
                    })
                    .collect::<Result<_, _>>()?,
            ),
        };

        Ok(parsed)
    }
}

fn compile_glob(pattern: &str, expr: &str) -> Result<GlobMatcher, CompwatchError> {
    Glob::new(expr)
        .map(|g| g.compile_matcher())
        .map_err(|e| invalid(pattern, e))
}

fn invalid(pattern: &str, reason: impl ToString) -> CompwatchError {
    CompwatchError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(pattern: &str, ids: &[&'static str]) -> Vec<&'static str> {
        let p: ComponentPattern = pattern.parse().unwrap();
        p.filter(ids.iter().copied())
    }

    #[test]
    fn exact_membership_keeps_registry_order() {
        assert_eq!(
            run("is:card,button", &["button", "card", "avatar"]),
            vec!["button", "card"]
        );
    }

    #[test]
    fn glob_prefix() {
        assert_eq!(
            run("glob:ui-*", &["ui-button", "ui-card", "icon"]),
            vec!["ui-button", "ui-card"]
        );
    }

    #[test]
    fn regex_prefix() {
        assert_eq!(
            run("reg:^ui-(card|icon)$", &["ui-button", "ui-card", "ui-icon"]),
            vec!["ui-card", "ui-icon"]
        );
    }

    #[test]
    fn bare_tokens_mix_glob_and_substring() {
        assert_eq!(
            run("butt, *-card", &["ui-button", "ui-card", "icon", "card"]),
            vec!["ui-button", "ui-card"]
        );
    }

    #[test]
    fn unknown_prefix_is_a_substring_token() {
        assert_eq!(
            run("scope:button", &["scope:button", "button"]),
            vec!["scope:button"]
        );
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        assert!(matches!(
            "reg:(".parse::<ComponentPattern>(),
            Err(CompwatchError::InvalidPattern { .. })
        ));
        assert!(matches!(
            "is: , ".parse::<ComponentPattern>(),
            Err(CompwatchError::InvalidPattern { .. })
        ));
    }
}
