//! Suggestions posted to a suggestion channel.

use anyhow::Result;
use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

use crate::cache::{canonical_int, CachedEntity, IndexDefinition};
use crate::database::{int_filter, MongoEntity};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "_id")]
    pub id: String,
    pub guild_id: String,
    /// Sequential per guild
    pub number: i64,
    pub author_id: String,
    pub content: String,
    /// Message carrying the vote buttons, once posted
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub status: SuggestionStatus,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub downvotes: u32,
}

impl Suggestion {
    pub fn new(
        guild_id: impl Into<String>,
        number: i64,
        author_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let guild_id = guild_id.into();
        Self {
            id: format!("{guild_id}-{number}"),
            guild_id,
            number,
            author_id: author_id.into(),
            content: content.into(),
            message_id: None,
            status: SuggestionStatus::Pending,
            upvotes: 0,
            downvotes: 0,
        }
    }

    pub fn indexes() -> Vec<IndexDefinition> {
        vec![
            IndexDefinition::new(["message_id"]),
            IndexDefinition::new(["guild_id", "number"]),
        ]
    }
}

impl CachedEntity for Suggestion {
    const TYPE_TAG: &'static str = "suggestion";
    const FIELDS: &'static [&'static str] = &["guild_id", "number", "message_id"];

    fn id(&self) -> String {
        self.id.clone()
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "guild_id" => Some(self.guild_id.clone()),
            "number" => Some(self.number.to_string()),
            "message_id" => self.message_id.clone(),
            _ => None,
        }
    }

    fn canonical(field: &str, raw: &str) -> Option<String> {
        match field {
            "number" => canonical_int(raw),
            _ => Some(raw.to_string()),
        }
    }
}

impl MongoEntity for Suggestion {
    const COLLECTION: &'static str = "suggestions";

    fn filter_value(field: &str, raw: &str) -> Result<Bson> {
        match field {
            "number" => int_filter(field, raw),
            _ => Ok(Bson::String(raw.to_string())),
        }
    }
}
