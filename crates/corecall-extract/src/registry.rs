//! Caller-owned extraction configuration.
//!
//! There is deliberately no process-wide registry: the caller builds one of
//! these, populates it once, and passes it by reference into extraction.

use corecall_types::descriptor::SemanticOverride;
use std::collections::BTreeMap;

/// Extraction configuration: which logical files count as system headers,
/// and which typedef names carry a host-side decode convention.
#[derive(Debug, Clone)]
pub struct Registry {
    system_prefixes: Vec<String>,
    overrides: BTreeMap<String, SemanticOverride>,
}

impl Registry {
    /// A registry with the conventional defaults: `/usr/` and `/opt/`
    /// prefixes are system paths, and the `cc_int` / `cc_bool` /
    /// `cc_float` typedefs carry their error-code conventions.
    pub fn new() -> Self {
        let mut overrides = BTreeMap::new();
        overrides.insert("cc_int".to_string(), SemanticOverride::ErrnoInt);
        overrides.insert("cc_bool".to_string(), SemanticOverride::ErrnoBool);
        overrides.insert("cc_float".to_string(), SemanticOverride::NanFloat);
        Self {
            system_prefixes: vec!["/usr/".to_string(), "/opt/".to_string()],
            overrides,
        }
    }

    /// A registry with no system prefixes and no overrides.
    pub fn empty() -> Self {
        Self {
            system_prefixes: Vec::new(),
            overrides: BTreeMap::new(),
        }
    }

    /// Add a path prefix whose declarations are ignored.
    pub fn with_system_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.system_prefixes.push(prefix.into());
        self
    }

    /// Register (or replace) a semantic override for a typedef name.
    pub fn with_override(mut self, name: impl Into<String>, semantic: SemanticOverride) -> Self {
        self.overrides.insert(name.into(), semantic);
        self
    }

    /// Whether declarations from this logical file should be ignored.
    pub fn is_system_file(&self, file: &str) -> bool {
        self.system_prefixes.iter().any(|p| file.starts_with(p))
    }

    /// The decode convention reserved for this typedef name, if any.
    pub fn override_for(&self, name: &str) -> Option<SemanticOverride> {
        self.overrides.get(name).copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
