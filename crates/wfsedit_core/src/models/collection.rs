//! Collection (feature type) references.

use serde::{Deserialize, Serialize};

/// A named server-side feature type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRef {
    /// Local name, e.g. `roads`.
    pub name: String,
    /// Prefixed name used on the wire, e.g. `ne:roads`.
    pub namespace_qualified_name: String,
    pub editable: bool,
    /// Human-readable title from the capabilities document, when known.
    #[serde(default)]
    pub title: Option<String>,
}

impl CollectionRef {
    /// Create a reference, qualifying `name` with `prefix` unless it already
    /// carries one.
    ///
    /// # Arguments
    /// - `name`: Local or already-qualified feature type name.
    /// - `prefix`: Namespace prefix applied to unqualified names.
    /// - `editable`: Whether transactions may target this collection.
    pub fn new(name: &str, prefix: &str, editable: bool) -> Self {
        let name = name.trim();
        match name.split_once(':') {
            Some((_, local)) => Self {
                name: local.to_string(),
                namespace_qualified_name: name.to_string(),
                editable,
                title: None,
            },
            None => Self {
                name: name.to_string(),
                namespace_qualified_name: if prefix.is_empty() {
                    name.to_string()
                } else {
                    format!("{}:{}", prefix, name)
                },
                editable,
                title: None,
            },
        }
    }

    /// Attach a display title.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// Title when present, otherwise the local name.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(self.name.as_str())
    }
}
