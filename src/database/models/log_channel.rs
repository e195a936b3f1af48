//! Log-channel routing.

use serde::{Deserialize, Serialize};

use crate::cache::{CachedEntity, IndexDefinition};
use crate::database::MongoEntity;

/// Event families that can be routed to a log channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogEvent {
    MessageDelete,
    MessageEdit,
    MemberJoin,
    MemberLeave,
    Moderation,
}

impl LogEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageDelete => "message_delete",
            Self::MessageEdit => "message_edit",
            Self::MemberJoin => "member_join",
            Self::MemberLeave => "member_leave",
            Self::Moderation => "moderation",
        }
    }
}

/// Where events of one type are logged in a guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogChannel {
    #[serde(rename = "_id")]
    pub id: String,
    pub guild_id: String,
    pub event_type: LogEvent,
    pub channel_id: String,
    #[serde(default)]
    pub enabled: bool,
}

impl LogChannel {
    pub fn new(guild_id: impl Into<String>, event_type: LogEvent, channel_id: impl Into<String>) -> Self {
        let guild_id = guild_id.into();
        Self {
            id: format!("{guild_id}-{}", event_type.as_str()),
            guild_id,
            event_type,
            channel_id: channel_id.into(),
            enabled: true,
        }
    }

    pub fn indexes() -> Vec<IndexDefinition> {
        vec![IndexDefinition::new(["guild_id", "event_type"])]
    }
}

impl CachedEntity for LogChannel {
    const TYPE_TAG: &'static str = "log_channel";
    const FIELDS: &'static [&'static str] = &["guild_id", "event_type"];

    fn id(&self) -> String {
        self.id.clone()
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "guild_id" => Some(self.guild_id.clone()),
            "event_type" => Some(self.event_type.as_str().to_string()),
            _ => None,
        }
    }
}

impl MongoEntity for LogChannel {
    const COLLECTION: &'static str = "log_channels";
}
