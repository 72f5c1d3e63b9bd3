use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::gateway::Ready;
use serenity::model::guild::Role;
use serenity::model::id::{GuildId, RoleId};
use serenity::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reminder_relay::core::Config;
use reminder_relay::features::calendar::GoogleCalendarSource;
use reminder_relay::features::markers::JsonMarkerFile;
use reminder_relay::features::notifier::{DiscordSink, Notifier};
use reminder_relay::features::policy::ReminderEngine;
use reminder_relay::features::roles::{GuildRoster, RoleResolver};
use reminder_relay::features::scheduler::ReminderDriver;

struct Handler {
    driver: Arc<ReminderDriver>,
    roles: Arc<RoleResolver>,
    guild_id: GuildId,
    run_on_start: bool,
    /// Set once the scheduler task is running, so reconnects don't start another
    scheduler_started: AtomicBool,
}

impl Handler {
    fn new(
        driver: Arc<ReminderDriver>,
        roles: Arc<RoleResolver>,
        guild_id: GuildId,
        run_on_start: bool,
    ) -> Self {
        Handler {
            driver,
            roles,
            guild_id,
            run_on_start,
            scheduler_started: AtomicBool::new(false),
        }
    }

    async fn refresh_roles(&self, http: Arc<Http>, reason: &str) {
        let roster = GuildRoster::new(http, self.guild_id.0);
        self.roles.refresh(&roster, reason).await;
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());

        if !ready.guilds.iter().any(|g| g.id == self.guild_id) {
            error!("❌ Guild with ID {} not found among connected guilds", self.guild_id);
        }

        self.refresh_roles(ctx.http.clone(), "startup").await;

        if self.scheduler_started.swap(true, Ordering::SeqCst) {
            info!("Reconnected; reminder scheduler already running");
            return;
        }

        let driver = self.driver.clone();
        let run_on_start = self.run_on_start;
        tokio::spawn(async move {
            driver.run(run_on_start).await;
        });
    }

    async fn guild_role_create(&self, ctx: Context, new: Role) {
        if new.guild_id != self.guild_id {
            return;
        }
        info!("New role created: {} ({})", new.name, new.id);
        self.refresh_roles(ctx.http.clone(), "role created").await;
    }

    async fn guild_role_delete(
        &self,
        ctx: Context,
        guild_id: GuildId,
        removed_role_id: RoleId,
        removed_role_data_if_available: Option<Role>,
    ) {
        if guild_id != self.guild_id {
            return;
        }
        let name = removed_role_data_if_available
            .map(|r| r.name)
            .unwrap_or_else(|| "unknown".to_string());
        info!("Role deleted: {name} ({removed_role_id})");
        self.refresh_roles(ctx.http.clone(), "role deleted").await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting reminder relay...");

    let source = GoogleCalendarSource::new(
        &config.credentials_path,
        config.calendar_id.clone(),
        config.timezone,
    )
    .await?;

    let roles = Arc::new(RoleResolver::new());
    let intents = GatewayIntents::GUILDS;

    // The handler owns the driver, so the driver gets its own HTTP handle
    // rather than the gateway client's
    let http = Arc::new(Http::new(&config.discord_token));
    let notifier = Notifier::new(
        Arc::new(DiscordSink::new(http)),
        config.channel_id,
        config.timezone,
    );

    let driver = Arc::new(ReminderDriver::new(
        Arc::new(source),
        Arc::new(JsonMarkerFile::new(&config.reminded_events_path)),
        ReminderEngine::new(config.policy.clone(), config.timezone),
        notifier,
        roles.clone(),
        config.cadence.clone(),
        config.max_results,
    ));

    let handler = Handler::new(
        driver,
        roles,
        GuildId(config.server_id),
        config.run_on_start,
    );

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
