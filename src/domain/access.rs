//! Allow/block list evaluation for column names.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::domain::error::{DomainError, DomainResult};

/// One or many strings, as accepted by the `allowed`/`blocked` options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Access list options.
///
/// A single string defaults to pattern mode and a list to literal mode,
/// unless the matching `*IsPattern` flag says otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<OneOrMany>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_is_pattern: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<OneOrMany>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_is_pattern: Option<bool>,
    /// Deprecated alias of `allowed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<OneOrMany>,
    /// Deprecated alias of `blocked`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blacklist: Option<OneOrMany>,
}

impl AccessConfig {
    pub fn is_empty(&self) -> bool {
        self.allowed.is_none()
            && self.blocked.is_none()
            && self.whitelist.is_none()
            && self.blacklist.is_none()
    }

    /// Fold the deprecated `whitelist`/`blacklist` names into `allowed`/`blocked`.
    pub fn resolve_aliases(self) -> Self {
        Self {
            allowed: resolve_alias(self.allowed, self.whitelist, "whitelist", "allowed"),
            allowed_is_pattern: self.allowed_is_pattern,
            blocked: resolve_alias(self.blocked, self.blacklist, "blacklist", "blocked"),
            blocked_is_pattern: self.blocked_is_pattern,
            whitelist: None,
            blacklist: None,
        }
    }
}

/// How a rule set matches a column name.
#[derive(Debug, Clone)]
pub enum RuleSet {
    /// Exact membership.
    Literal(HashSet<String>),
    /// Match if any pattern matches. Compiled on first use.
    Pattern {
        patterns: Vec<String>,
        compiled: OnceLock<Result<Vec<Regex>, DomainError>>,
    },
}

impl RuleSet {
    pub fn literal<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RuleSet::Literal(values.into_iter().map(Into::into).collect())
    }

    pub fn pattern<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RuleSet::Pattern {
            patterns: patterns.into_iter().map(Into::into).collect(),
            compiled: OnceLock::new(),
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, RuleSet::Pattern { .. })
    }

    fn from_values(values: OneOrMany, is_pattern: Option<bool>) -> Self {
        let default_pattern = matches!(values, OneOrMany::One(_));
        let values = values.into_vec();
        if is_pattern.unwrap_or(default_pattern) {
            RuleSet::pattern(values)
        } else {
            RuleSet::literal(values)
        }
    }

    fn matches(&self, name: &str) -> DomainResult<bool> {
        match self {
            RuleSet::Literal(set) => Ok(set.contains(name)),
            RuleSet::Pattern { patterns, compiled } => {
                let regexes = compiled
                    .get_or_init(|| patterns.iter().map(|p| compile_pattern(p)).collect())
                    .as_ref()
                    .map_err(Clone::clone)?;
                Ok(regexes.iter().any(|re| re.is_match(name)))
            }
        }
    }
}

/// Decides whether a column name passes the configured allow/block rules.
///
/// Allow is evaluated first; block always has the final veto.
#[derive(Debug, Clone, Default)]
pub struct AccessFilter {
    allow: Option<RuleSet>,
    block: Option<RuleSet>,
}

impl AccessFilter {
    /// A filter that lets every name through.
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn new(allow: Option<RuleSet>, block: Option<RuleSet>) -> Self {
        Self { allow, block }
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        let config = config.clone().resolve_aliases();
        Self {
            allow: config
                .allowed
                .map(|v| RuleSet::from_values(v, config.allowed_is_pattern)),
            block: config
                .blocked
                .map(|v| RuleSet::from_values(v, config.blocked_is_pattern)),
        }
    }

    pub fn allow(&self) -> Option<&RuleSet> {
        self.allow.as_ref()
    }

    pub fn block(&self) -> Option<&RuleSet> {
        self.block.as_ref()
    }

    /// Decide whether `name` passes the filter.
    ///
    /// # Errors
    /// `InvalidPattern` when a configured pattern does not compile. The error is
    /// produced on the first evaluation and repeated on every later one.
    pub fn is_allowed(&self, name: &str) -> DomainResult<bool> {
        if let Some(allow) = &self.allow {
            if !allow.matches(name)? {
                trace!(name, "not in allow list");
                return Ok(false);
            }
        }
        if let Some(block) = &self.block {
            if block.matches(name)? {
                trace!(name, "in block list");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Compile every pattern now instead of on first use.
    pub fn validate(&self) -> DomainResult<()> {
        for rules in [&self.allow, &self.block].into_iter().flatten() {
            rules.matches("")?;
        }
        Ok(())
    }
}

fn resolve_alias(
    current: Option<OneOrMany>,
    legacy: Option<OneOrMany>,
    old: &str,
    new: &str,
) -> Option<OneOrMany> {
    if legacy.is_some() {
        warn!("The use of the '{}' option is deprecated; use '{}' instead.", old, new);
    }
    current.or(legacy)
}

/// Compile a pattern, accepting the delimited `/body/flags` form.
fn compile_pattern(pattern: &str) -> DomainResult<Regex> {
    let source = translate_delimited(pattern)?;
    Regex::new(&source).map_err(|e| DomainError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Turn `/body/flags` into `(?flags)body`. Undelimited patterns pass through.
fn translate_delimited(pattern: &str) -> DomainResult<String> {
    let mut chars = pattern.chars();
    let open = match chars.next() {
        Some(c) if !c.is_alphanumeric() && !c.is_whitespace() && c != '\\' && c != '^' && c != '(' && c != '[' => c,
        _ => return Ok(pattern.to_string()),
    };
    let close = match open {
        '{' => '}',
        '<' => '>',
        other => other,
    };
    let rest = &pattern[open.len_utf8()..];
    let Some(end) = rest.rfind(close) else {
        return Ok(pattern.to_string());
    };
    let (body, flags) = (&rest[..end], &rest[end + close.len_utf8()..]);

    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' | 'x' | 'U' => inline.push(flag),
            'u' => {}
            other => {
                return Err(DomainError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: format!("unsupported modifier '{}'", other),
                })
            }
        }
    }
    if inline.is_empty() {
        Ok(body.to_string())
    } else {
        Ok(format!("(?{}){}", inline, body))
    }
}
