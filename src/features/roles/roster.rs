//! Discord guild roster
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{Context, Result};
use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::id::GuildId;
use std::sync::Arc;

use super::resolver::RosterSource;

/// Fetches the live role list of one guild over the HTTP API
pub struct GuildRoster {
    http: Arc<Http>,
    guild_id: GuildId,
}

impl GuildRoster {
    pub fn new(http: Arc<Http>, guild_id: u64) -> Self {
        Self {
            http,
            guild_id: GuildId(guild_id),
        }
    }
}

#[async_trait]
impl RosterSource for GuildRoster {
    async fn fetch_roles(&self) -> Result<Vec<(String, u64)>> {
        let roles = self
            .guild_id
            .roles(&self.http)
            .await
            .with_context(|| format!("Failed to fetch roles for guild {}", self.guild_id))?;

        Ok(roles
            .into_values()
            .map(|role| (role.name, role.id.0))
            .collect())
    }
}
