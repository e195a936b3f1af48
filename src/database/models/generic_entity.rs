//! Free-form keyed records (tags, custom commands, reaction roles).

use serde::{Deserialize, Serialize};

use crate::cache::{CachedEntity, IndexDefinition};
use crate::database::MongoEntity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub guild_id: String,
    /// Record family, e.g. `tag`
    pub kind: String,
    /// Lookup name within the family
    pub key: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl GenericEntity {
    pub fn new(
        guild_id: impl Into<String>,
        kind: impl Into<String>,
        key: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        let (guild_id, kind, key) = (guild_id.into(), kind.into(), key.into());
        Self {
            id: format!("{guild_id}-{kind}-{key}"),
            guild_id,
            kind,
            key,
            data,
        }
    }

    pub fn indexes() -> Vec<IndexDefinition> {
        vec![IndexDefinition::new(["guild_id", "kind", "key"])]
    }
}

impl CachedEntity for GenericEntity {
    const TYPE_TAG: &'static str = "entity";
    const FIELDS: &'static [&'static str] = &["guild_id", "kind", "key"];

    fn id(&self) -> String {
        self.id.clone()
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "guild_id" => Some(self.guild_id.clone()),
            "kind" => Some(self.kind.clone()),
            "key" => Some(self.key.clone()),
            _ => None,
        }
    }
}

impl MongoEntity for GenericEntity {
    const COLLECTION: &'static str = "entities";
}
