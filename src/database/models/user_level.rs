//! Leveling records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CachedEntity, IndexDefinition};
use crate::database::MongoEntity;

/// Experience and level of one member in one guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLevel {
    #[serde(rename = "_id")]
    pub id: String,
    pub guild_id: String,
    pub user_id: String,
    #[serde(default)]
    pub xp: i64,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
}

impl UserLevel {
    pub fn new(guild_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let guild_id = guild_id.into();
        let user_id = user_id.into();
        Self {
            id: format!("{guild_id}-{user_id}"),
            guild_id,
            user_id,
            xp: 0,
            level: 0,
            last_message_at: None,
        }
    }

    /// XP needed to go from `level` to `level + 1`.
    pub fn xp_for_next(level: i32) -> i64 {
        let l = i64::from(level);
        5 * l * l + 50 * l + 100
    }

    /// Add XP, rolling over levels. Returns true if the level went up.
    pub fn add_xp(&mut self, amount: i64) -> bool {
        let start = self.level;
        self.xp += amount;
        while self.xp >= Self::xp_for_next(self.level) {
            self.xp -= Self::xp_for_next(self.level);
            self.level += 1;
        }
        self.last_message_at = Some(Utc::now());
        self.level > start
    }

    pub fn indexes() -> Vec<IndexDefinition> {
        vec![IndexDefinition::new(["guild_id", "user_id"])]
    }
}

impl CachedEntity for UserLevel {
    const TYPE_TAG: &'static str = "user_level";
    const FIELDS: &'static [&'static str] = &["guild_id", "user_id"];

    fn id(&self) -> String {
        self.id.clone()
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "guild_id" => Some(self.guild_id.clone()),
            "user_id" => Some(self.user_id.clone()),
            _ => None,
        }
    }
}

impl MongoEntity for UserLevel {
    const COLLECTION: &'static str = "user_levels";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xp_rolls_over_into_levels() {
        let mut record = UserLevel::new("g", "u");
        assert!(!record.add_xp(99));
        assert!(record.add_xp(1));
        assert_eq!(record.level, 1);
        assert_eq!(record.xp, 0);

        // 155 for level 1 -> 2, then 220 for 2 -> 3.
        assert!(record.add_xp(155 + 220 + 5));
        assert_eq!(record.level, 3);
        assert_eq!(record.xp, 5);
    }
}
