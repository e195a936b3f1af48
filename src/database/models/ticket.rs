//! Support tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CachedEntity, IndexDefinition};
use crate::database::MongoEntity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Open,
    Closed,
}

/// A support ticket opened from a ticket panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "_id")]
    pub id: String,
    pub guild_id: String,
    /// Panel (category) the ticket was opened from
    pub parent_id: String,
    pub author_id: String,
    /// Channel created for the ticket, once it exists
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(
        id: impl Into<String>,
        guild_id: impl Into<String>,
        parent_id: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            guild_id: guild_id.into(),
            parent_id: parent_id.into(),
            author_id: author_id.into(),
            channel_id: None,
            subject: None,
            status: TicketStatus::Open,
            created_at: Utc::now(),
        }
    }

    pub fn indexes() -> Vec<IndexDefinition> {
        vec![
            IndexDefinition::new(["guild_id", "parent_id", "author_id"]),
            IndexDefinition::new(["channel_id"]),
        ]
    }
}

impl CachedEntity for Ticket {
    const TYPE_TAG: &'static str = "ticket";
    const FIELDS: &'static [&'static str] = &["guild_id", "parent_id", "author_id", "channel_id"];

    fn id(&self) -> String {
        self.id.clone()
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "guild_id" => Some(self.guild_id.clone()),
            "parent_id" => Some(self.parent_id.clone()),
            "author_id" => Some(self.author_id.clone()),
            "channel_id" => self.channel_id.clone(),
            _ => None,
        }
    }
}

impl MongoEntity for Ticket {
    const COLLECTION: &'static str = "tickets";
}
