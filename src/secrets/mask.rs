//! Output masking for secret values.
//!
//! Every report and log line the bootstrap emits passes through a masker.
//! Secret values are registered as they are resolved, before anything that
//! could echo them runs.

use std::collections::HashMap;

/// Masks secret values in output strings.
///
/// # Example
///
/// ```
/// use groundwork::secrets::OutputMasker;
///
/// let mut masker = OutputMasker::new();
/// masker.add_secret("super-secret-value");
///
/// let output = masker.mask("The key is super-secret-value here");
/// assert_eq!(output, "The key is [REDACTED] here");
/// ```
pub struct OutputMasker {
    /// Map of secret values to their masked representation.
    secrets: HashMap<String, String>,
    /// The mask string to use.
    mask: String,
}

impl OutputMasker {
    /// Create a new masker with default mask string.
    pub fn new() -> Self {
        Self {
            secrets: HashMap::new(),
            mask: "[REDACTED]".to_string(),
        }
    }

    /// Create a masker with a custom mask string.
    pub fn with_mask(mask: impl Into<String>) -> Self {
        Self {
            secrets: HashMap::new(),
            mask: mask.into(),
        }
    }

    /// Register a secret value to be masked.
    ///
    /// Empty strings are ignored.
    pub fn add_secret(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.secrets.insert(value, self.mask.clone());
        }
    }

    /// Register multiple secret values.
    pub fn add_secrets(&mut self, values: impl IntoIterator<Item = impl Into<String>>) {
        for value in values {
            self.add_secret(value);
        }
    }

    /// Mask any secret values in the given string.
    pub fn mask(&self, input: &str) -> String {
        let mut result = input.to_string();
        for (secret, mask) in &self.secrets {
            result = result.replace(secret, mask);
        }
        result
    }

    /// Get the number of registered secrets.
    pub fn secret_count(&self) -> usize {
        self.secrets.len()
    }
}

impl Default for OutputMasker {
    fn default() -> Self {
        Self::new()
    }
}
