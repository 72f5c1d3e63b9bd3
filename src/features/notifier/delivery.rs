//! Reminder delivery
//!
//! Sends are fire-and-forget from the caller's point of view: a failed send
//! is logged and reported back, never raised.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Destination check before each tick
//! - 1.0.0: Initial release

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono_tz::Tz;
use log::{error, info};
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;

use super::message::compose_reminder;
use crate::core::error::{RelayError, RelayResult};
use crate::features::calendar::Event;

/// A chat service that can post plain text into a channel
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Confirm the channel exists and is reachable
    async fn check_destination(&self, channel_id: u64) -> Result<()>;

    async fn send(&self, channel_id: u64, content: &str) -> Result<()>;
}

/// Posts through the Discord HTTP API
pub struct DiscordSink {
    http: Arc<Http>,
}

impl DiscordSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatSink for DiscordSink {
    async fn check_destination(&self, channel_id: u64) -> Result<()> {
        ChannelId(channel_id)
            .to_channel(&self.http)
            .await
            .with_context(|| format!("Discord channel {channel_id} not found"))?;
        Ok(())
    }

    async fn send(&self, channel_id: u64, content: &str) -> Result<()> {
        ChannelId(channel_id).say(&self.http, content).await?;
        Ok(())
    }
}

/// Formats reminders and delivers them to the configured channel
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn ChatSink>,
    channel_id: u64,
    timezone: Tz,
}

impl Notifier {
    pub fn new(sink: Arc<dyn ChatSink>, channel_id: u64, timezone: Tz) -> Self {
        Self {
            sink,
            channel_id,
            timezone,
        }
    }

    pub fn channel_id(&self) -> u64 {
        self.channel_id
    }

    pub fn compose(&self, event: &Event, role_id: Option<u64>) -> String {
        compose_reminder(event, self.timezone, role_id)
    }

    pub async fn check_destination(&self) -> RelayResult<()> {
        self.sink
            .check_destination(self.channel_id)
            .await
            .map_err(|e| RelayError::provider(format!("{e:#}")))
    }

    pub async fn deliver(&self, content: &str) -> RelayResult<()> {
        info!("Sending reminder: {content}");
        match self.sink.send(self.channel_id, content).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("❌ Error sending message to channel {}: {e:#}", self.channel_id);
                Err(RelayError::provider(format!("{e:#}")))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records sends; any message containing a `fail_on` needle errors
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) sent: Mutex<Vec<(u64, String)>>,
        pub(crate) fail_on: HashSet<String>,
        pub(crate) missing_destination: bool,
    }

    impl RecordingSink {
        pub(crate) fn messages(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
        }
    }

    #[async_trait]
    impl ChatSink for RecordingSink {
        async fn check_destination(&self, channel_id: u64) -> Result<()> {
            if self.missing_destination {
                anyhow::bail!("channel {channel_id} not found");
            }
            Ok(())
        }

        async fn send(&self, channel_id: u64, content: &str) -> Result<()> {
            if self.fail_on.iter().any(|needle| content.contains(needle.as_str())) {
                anyhow::bail!("simulated send failure");
            }
            self.sent
                .lock()
                .unwrap()
                .push((channel_id, content.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::RecordingSink;
    use super::*;

    #[tokio::test]
    async fn test_deliver_posts_to_configured_channel() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone(), 777, Tz::UTC);

        notifier.deliver("Reminder: x is on 1/1/2025").await.unwrap();

        let sent = sink.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![(777, "Reminder: x is on 1/1/2025".to_string())]);
    }

    #[tokio::test]
    async fn test_failed_send_is_reported_not_raised() {
        let sink = Arc::new(RecordingSink {
            fail_on: ["boom".to_string()].into_iter().collect(),
            ..Default::default()
        });
        let notifier = Notifier::new(sink.clone(), 1, Tz::UTC);

        let result = notifier.deliver("boom").await;
        assert!(matches!(result, Err(RelayError::TransientProvider(_))));
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn test_missing_destination() {
        let sink = Arc::new(RecordingSink {
            missing_destination: true,
            ..Default::default()
        });
        let notifier = Notifier::new(sink, 1, Tz::UTC);
        assert!(notifier.check_destination().await.is_err());
    }
}
