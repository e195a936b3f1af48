//! Secondary index definitions.

use std::collections::HashSet;
use std::fmt;

use super::{CacheError, CachedEntity, FieldSnapshot};

/// Ordered tuple of field names that must be independently lookupable.
///
/// Definitions are declared once at startup and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexDefinition {
    fields: Vec<String>,
}

impl IndexDefinition {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// True if this definition covers exactly `fields`, in order.
    pub fn matches(&self, fields: &[&str]) -> bool {
        self.fields.len() == fields.len() && self.fields.iter().zip(fields).all(|(a, b)| a == b)
    }

    /// Field-name signature embedded in index keys, e.g. `guild_id+event_type`.
    pub fn signature(&self) -> String {
        self.fields.join("+")
    }

    /// Positional values of this definition on `entity`.
    pub fn values_of<E: CachedEntity>(&self, entity: &E) -> Vec<Option<String>> {
        self.fields.iter().map(|f| entity.field(f)).collect()
    }

    /// Positional values of this definition in a field snapshot.
    pub fn values_in(&self, snapshot: &FieldSnapshot) -> Vec<Option<String>> {
        self.fields.iter().map(|f| snapshot.get(f).cloned()).collect()
    }

    /// Check this definition against the fields `E` exposes.
    pub fn validate<E: CachedEntity>(&self) -> Result<(), CacheError> {
        let invalid = |reason: String| CacheError::InvalidIndex {
            entity: E::TYPE_TAG,
            reason,
        };

        if self.fields.is_empty() {
            return Err(invalid("index has no fields".to_string()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            let well_formed = !field.is_empty()
                && field
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
            if !well_formed {
                return Err(invalid(format!("malformed field name {field:?}")));
            }
            if !E::FIELDS.contains(&field.as_str()) {
                return Err(invalid(format!("{field} is not an indexable field")));
            }
            if !seen.insert(field.as_str()) {
                return Err(invalid(format!("{field} appears twice in [{}]", self.signature())));
            }
        }
        Ok(())
    }
}

impl fmt::Display for IndexDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.fields.join(", "))
    }
}

/// Validate a whole definition set for `E`, rejecting repeats.
pub fn validate_definitions<E: CachedEntity>(defs: &[IndexDefinition]) -> Result<(), CacheError> {
    let mut seen = HashSet::new();
    for def in defs {
        def.validate::<E>()?;
        if !seen.insert(def) {
            return Err(CacheError::InvalidIndex {
                entity: E::TYPE_TAG,
                reason: format!("index {def} declared twice"),
            });
        }
    }
    Ok(())
}
