//! Message lookup for user-facing copy.
//!
//! Keys are namespaced by resource (`customers.delete_success`). Lookups fall
//! back to the bare key, then to the key itself.

use std::collections::HashMap;

pub trait Translate: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

impl<F> Translate for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn translate(&self, key: &str) -> String {
        self(key)
    }
}

/// Resolve `key` inside the `namespace` of a resource.
pub fn scoped(translator: &dyn Translate, namespace: &str, key: &str) -> String {
    translator.translate(&format!("{}.{}", namespace, key))
}

const ENGLISH: &[(&str, &str)] = &[
    ("confirm_delete", "Are you sure you want to delete this record?"),
    ("delete", "Delete"),
    ("cancel", "Cancel"),
    ("delete_success", "Deleted successfully"),
    ("delete_error", "Something went wrong while deleting"),
    ("fetch_error", "Could not load the list"),
    ("save_success", "Saved successfully"),
    ("save_error", "Something went wrong while saving"),
    ("validation_error", "Please correct the highlighted fields"),
    ("generating_pdf", "Generating the file..."),
    ("pdf_success", "File created"),
    ("pdf_error", "Could not create the file"),
    ("unknown_error", "Unknown error"),
];

/// Built-in message catalog with English defaults.
#[derive(Debug, Clone)]
pub struct Catalog {
    messages: HashMap<String, String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::english()
    }
}

impl Catalog {
    pub fn english() -> Self {
        Self {
            messages: ENGLISH
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Override or add a message.
    pub fn with(mut self, key: &str, message: &str) -> Self {
        self.messages.insert(key.to_string(), message.to_string());
        self
    }
}

impl Translate for Catalog {
    fn translate(&self, key: &str) -> String {
        if let Some(message) = self.messages.get(key) {
            return message.clone();
        }
        key.rsplit_once('.')
            .and_then(|(_, bare)| self.messages.get(bare))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
