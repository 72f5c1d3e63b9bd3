//! # Roles Feature
//!
//! Role mentions for reminders: description tags and the guild role map.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod resolver;
pub mod roster;

pub use resolver::{extract_role_tag, RoleResolver, RoleTag, RosterSource};
pub use roster::GuildRoster;
