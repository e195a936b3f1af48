//! Cache key derivation.
//!
//! Layout:
//! - `{prefix}:{tag}:id:{id}` - primary record
//! - `{prefix}:{tag}:idx:{f1+f2}:{v1}:{v2}` - index pointer
//!
//! Ids and values are escaped so a `:` inside a value cannot forge a
//! separator, which keeps the mapping injective.

use super::IndexDefinition;

/// Builds keys for one entity type.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    base: String,
}

impl KeyBuilder {
    pub fn new(prefix: &str, type_tag: &str) -> Self {
        Self {
            base: format!("{prefix}:{}", escape(type_tag)),
        }
    }

    /// Key of the primary record for `id`.
    pub fn primary_key(&self, id: &str) -> String {
        format!("{}:id:{}", self.base, escape(id))
    }

    /// Key of the index pointer for `values` under `def`.
    ///
    /// Returns `None` when the tuple is not indexable: a value is missing or
    /// the arity does not match the definition.
    pub fn index_key<S: AsRef<str>>(
        &self,
        def: &IndexDefinition,
        values: &[Option<S>],
    ) -> Option<String> {
        if values.len() != def.fields().len() {
            return None;
        }

        let mut key = format!("{}:idx:{}", self.base, def.signature());
        for value in values {
            key.push(':');
            key.push_str(&escape(value.as_ref()?.as_ref()));
        }
        Some(key)
    }
}

fn escape(raw: &str) -> String {
    if !raw.contains(['%', ':']) {
        return raw.to_string();
    }
    raw.replace('%', "%25").replace(':', "%3A")
}
