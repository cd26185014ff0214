//! Secrets file loading.
//!
//! The optional secrets file uses the standard KEY=value format. Entries
//! here take precedence over process environment variables when rendering
//! templates.
//!
//! # Supported Formats
//!
//! - Simple: `KEY=value`
//! - Quoted: `KEY="value with spaces"` or `KEY='single quoted'`
//! - Empty: `KEY=`
//! - Comments: `# This is a comment`
//! - Values with equals signs: `URL=https://example.com?foo=bar`

use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;

/// Secret values loaded from an optional env-format file.
#[derive(Debug, Default)]
pub struct SecretStore {
    entries: HashMap<String, String>,
}

impl SecretStore {
    /// An empty store (no secrets file).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a secrets file, returning an empty store if it doesn't exist.
    ///
    /// A missing secrets file is the normal case, not an error: the
    /// renderer falls back to environment variables and placeholders.
    pub fn load_optional(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no secrets file");
            return Ok(Self::empty());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Parse env-format content into a store.
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();

        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = parse_line(line) {
                entries.insert(key, value);
            }
        }

        Self { entries }
    }

    /// Look up a secret by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// All non-empty secret values, for masker registration.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a single KEY=value line.
fn parse_line(line: &str) -> Option<(String, String)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim().to_string();
    if key.is_empty() {
        return None;
    }
    let value = unquote(line[eq_pos + 1..].trim());
    Some((key, value))
}

/// Remove surrounding quotes from a value.
fn unquote(value: &str) -> String {
    if (value.starts_with('"') && value.ends_with('"'))
        || (value.starts_with('\'') && value.ends_with('\''))
    {
        if value.len() >= 2 {
            value[1..value.len() - 1].to_string()
        } else {
            value.to_string()
        }
    } else {
        value.to_string()
    }
}
