//! Entity models and their index declarations.

pub mod generic_entity;
pub mod guild_config;
pub mod log_channel;
pub mod mod_case;
pub mod suggestion;
pub mod ticket;
pub mod user_level;

pub use generic_entity::GenericEntity;
pub use guild_config::GuildConfig;
pub use log_channel::{LogChannel, LogEvent};
pub use mod_case::{CaseAction, ModCase};
pub use suggestion::{Suggestion, SuggestionStatus};
pub use ticket::{Ticket, TicketStatus};
pub use user_level::UserLevel;
