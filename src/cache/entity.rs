//! Entity contract for cached records.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Field name -> value, for the indexable fields of one entity version.
pub type FieldSnapshot = BTreeMap<String, String>;

/// A record owned by the authoritative store that the cache may hold a copy of.
pub trait CachedEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Type tag embedded in every key of this entity type.
    const TYPE_TAG: &'static str;

    /// Fields that index definitions may reference.
    const FIELDS: &'static [&'static str];

    /// Primary id.
    fn id(&self) -> String;

    /// Current value of an indexable field, `None` when unset.
    fn field(&self, name: &str) -> Option<String>;

    /// Lookup value `raw` for `field` in the form [`Self::field`] renders it,
    /// `None` when no entity could hold it.
    fn canonical(_field: &str, raw: &str) -> Option<String> {
        Some(raw.to_string())
    }
}

/// Decimal rendering of an integer lookup value (`"07"` -> `"7"`).
pub fn canonical_int(raw: &str) -> Option<String> {
    raw.parse::<i64>().ok().map(|n| n.to_string())
}

/// All indexable field values currently set on `entity`.
pub fn snapshot<E: CachedEntity>(entity: &E) -> FieldSnapshot {
    E::FIELDS
        .iter()
        .filter_map(|name| entity.field(name).map(|v| (name.to_string(), v)))
        .collect()
}

/// The previous values of indexable fields that differ between two versions.
///
/// A field that was set before and is unset now is included; a field that
/// was unset before has no old pointer and is skipped.
pub fn changed_fields<E: CachedEntity>(previous: &E, next: &E) -> FieldSnapshot {
    E::FIELDS
        .iter()
        .filter_map(|name| {
            let old = previous.field(name)?;
            (next.field(name).as_deref() != Some(old.as_str())).then(|| (name.to_string(), old))
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testing::Probe;
    use super::*;

    #[test]
    fn snapshot_skips_unset_fields() {
        let probe = Probe::new("1", "g", None);
        let snap = snapshot(&probe);
        assert_eq!(snap.get("guild_id").map(String::as_str), Some("g"));
        assert!(!snap.contains_key("slot"));
    }

    #[test]
    fn integer_values_are_canonicalised() {
        assert_eq!(canonical_int("07").as_deref(), Some("7"));
        assert_eq!(canonical_int("+12").as_deref(), Some("12"));
        assert_eq!(canonical_int("-3").as_deref(), Some("-3"));
        assert_eq!(canonical_int("seven"), None);
        assert_eq!(Probe::canonical("slot", "07").as_deref(), Some("07"));
    }

    #[test]
    fn changed_fields_reports_old_values_only() {
        let before = Probe::new("1", "g", Some("a"));
        let mut after = before.clone();
        after.slot = Some("b".to_string());

        let changed = changed_fields(&before, &after);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed.get("slot").map(String::as_str), Some("a"));

        after.slot = None;
        let cleared = changed_fields(&before, &after);
        assert_eq!(cleared.get("slot").map(String::as_str), Some("a"));

        assert!(changed_fields(&before, &before).is_empty());
    }
}
