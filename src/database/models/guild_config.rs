//! Per-guild configuration.
//!
//! Keyed by guild id alone, so it needs no secondary index.

use serde::{Deserialize, Serialize};

use crate::cache::{CachedEntity, IndexDefinition};
use crate::database::MongoEntity;

/// Top-level settings for one guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildConfig {
    /// Guild id (document id)
    #[serde(rename = "_id")]
    pub guild_id: String,

    /// Command prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Locale used for replies
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Role granted moderator permissions
    #[serde(default)]
    pub mod_role_id: Option<String>,

    /// Role applied on mute
    #[serde(default)]
    pub mute_role_id: Option<String>,

    /// Whether the leveling system is enabled
    #[serde(default)]
    pub leveling_enabled: bool,
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

impl GuildConfig {
    /// Create default configuration for a guild.
    pub fn new(guild_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            prefix: default_prefix(),
            locale: default_locale(),
            mod_role_id: None,
            mute_role_id: None,
            leveling_enabled: false,
        }
    }

    pub fn indexes() -> Vec<IndexDefinition> {
        Vec::new()
    }
}

impl CachedEntity for GuildConfig {
    const TYPE_TAG: &'static str = "guild_config";
    const FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> String {
        self.guild_id.clone()
    }

    fn field(&self, _name: &str) -> Option<String> {
        None
    }
}

impl MongoEntity for GuildConfig {
    const COLLECTION: &'static str = "guild_configs";
}
