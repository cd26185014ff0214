//! Template value resolution.
//!
//! Values are sourced with a fixed precedence: an explicit secrets-file
//! entry wins over a process environment variable, which wins over the
//! documented placeholder string. The placeholder renders a config that is
//! usable but non-functional (a human can open it and see exactly which
//! token to fill in) instead of failing the run.

use crate::secrets::SecretStore;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Explicit entry in the secrets file.
    SecretFile,
    /// Process environment variable.
    Environment,
    /// Documented fallback string; the config needs hand-editing.
    Placeholder,
}

/// A value ready for substitution.
#[derive(Debug, Clone)]
pub struct ResolvedValue {
    pub value: String,
    pub source: ValueSource,
}

impl ResolvedValue {
    /// Whether the value is a real secret (and must be masked in output).
    pub fn is_secret(&self) -> bool {
        !matches!(self.source, ValueSource::Placeholder)
    }

    /// Whether the fallback placeholder was used.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.source, ValueSource::Placeholder)
    }
}

/// Resolve a secret-bearing value by key.
///
/// An environment variable that is set but empty counts as absent: an
/// empty token in a rendered config is silently broken, the placeholder
/// at least says what belongs there.
pub fn resolve(key: &str, store: &SecretStore, placeholder: &str) -> ResolvedValue {
    resolve_with_env(key, store, placeholder, |k| std::env::var(k).ok())
}

/// Resolve with an injectable environment lookup, for tests.
pub fn resolve_with_env<F>(
    key: &str,
    store: &SecretStore,
    placeholder: &str,
    env_fn: F,
) -> ResolvedValue
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = store.get(key) {
        if !value.is_empty() {
            return ResolvedValue {
                value: value.to_string(),
                source: ValueSource::SecretFile,
            };
        }
    }

    if let Some(value) = env_fn(key) {
        if !value.is_empty() {
            return ResolvedValue {
                value,
                source: ValueSource::Environment,
            };
        }
    }

    ResolvedValue {
        value: placeholder.to_string(),
        source: ValueSource::Placeholder,
    }
}
