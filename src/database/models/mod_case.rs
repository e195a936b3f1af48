//! Moderation cases.

use anyhow::Result;
use chrono::{DateTime, Utc};
use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

use crate::cache::{canonical_int, CachedEntity, IndexDefinition};
use crate::database::{int_filter, MongoEntity};

/// Moderation action recorded by a case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaseAction {
    Warn,
    Mute,
    Kick,
    Ban,
    Unban,
}

/// One numbered moderation case in a guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModCase {
    #[serde(rename = "_id")]
    pub id: String,
    pub guild_id: String,
    /// Sequential per guild, starting at 1
    pub case_number: i64,
    pub action: CaseAction,
    pub target_id: String,
    pub moderator_id: String,
    #[serde(default)]
    pub reason: Option<String>,
    /// Message posted in the mod-log channel, once sent
    #[serde(default)]
    pub log_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ModCase {
    pub fn new(
        guild_id: impl Into<String>,
        case_number: i64,
        action: CaseAction,
        target_id: impl Into<String>,
        moderator_id: impl Into<String>,
    ) -> Self {
        let guild_id = guild_id.into();
        Self {
            id: format!("{guild_id}-{case_number}"),
            guild_id,
            case_number,
            action,
            target_id: target_id.into(),
            moderator_id: moderator_id.into(),
            reason: None,
            log_message_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn indexes() -> Vec<IndexDefinition> {
        vec![
            IndexDefinition::new(["guild_id", "case_number"]),
            IndexDefinition::new(["log_message_id"]),
        ]
    }
}

impl CachedEntity for ModCase {
    const TYPE_TAG: &'static str = "mod_case";
    const FIELDS: &'static [&'static str] = &["guild_id", "case_number", "log_message_id"];

    fn id(&self) -> String {
        self.id.clone()
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "guild_id" => Some(self.guild_id.clone()),
            "case_number" => Some(self.case_number.to_string()),
            "log_message_id" => self.log_message_id.clone(),
            _ => None,
        }
    }

    fn canonical(field: &str, raw: &str) -> Option<String> {
        match field {
            "case_number" => canonical_int(raw),
            _ => Some(raw.to_string()),
        }
    }
}

impl MongoEntity for ModCase {
    const COLLECTION: &'static str = "mod_cases";

    fn filter_value(field: &str, raw: &str) -> Result<Bson> {
        match field {
            "case_number" => int_filter(field, raw),
            _ => Ok(Bson::String(raw.to_string())),
        }
    }
}
