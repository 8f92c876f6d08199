use crate::message::{NotifyLevel, NotifyMessage};
use crate::notifier::{Notifier, NotifierError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

fn http_client() -> Result<reqwest::Client, NotifierError> {
    Ok(reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?)
}

// ============================================================================
// Slack 通知
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default = "default_slack_enabled")]
    pub enabled: bool,
    #[serde(default = "default_slack_username")]
    pub username: String,
    #[serde(default = "default_slack_icon")]
    pub icon_emoji: String,
}

fn default_slack_enabled() -> bool {
    true
}

fn default_slack_username() -> String {
    "vigil".to_string()
}

fn default_slack_icon() -> String {
    ":robot_face:".to_string()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            channel: String::new(),
            enabled: default_slack_enabled(),
            username: default_slack_username(),
            icon_emoji: default_slack_icon(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SlackPayload<'a> {
    channel: &'a str,
    username: &'a str,
    icon_emoji: &'a str,
    attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment {
    color: &'static str,
    title: String,
    text: String,
    fields: Vec<SlackField>,
    ts: String,
}

#[derive(Debug, Serialize)]
struct SlackField {
    title: String,
    value: String,
    short: bool,
}

pub struct SlackNotifier {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(config: SlackConfig) -> Result<Self, NotifierError> {
        Ok(Self {
            config,
            client: http_client()?,
        })
    }

    fn build_payload<'a>(&'a self, message: &NotifyMessage) -> SlackPayload<'a> {
        let (emoji, color) = match message.level {
            NotifyLevel::Critical => (":red_circle:", "danger"),
            NotifyLevel::Warning => (":warning:", "warning"),
        };
        let level = match message.level {
            NotifyLevel::Critical => "CRITICAL",
            NotifyLevel::Warning => "WARNING",
        };

        // BTreeMap 保证字段按 key 有序
        let fields = message
            .fields
            .iter()
            .map(|(title, value)| SlackField {
                title: title.clone(),
                value: value.clone(),
                short: true,
            })
            .collect();

        SlackPayload {
            channel: &self.config.channel,
            username: &self.config.username,
            icon_emoji: &self.config.icon_emoji,
            attachments: vec![SlackAttachment {
                color,
                title: format!("{} [{}] {}", emoji, level, message.title),
                text: message.content.clone(),
                fields,
                ts: message.timestamp.timestamp().to_string(),
            }],
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, message: &NotifyMessage) -> Result<(), NotifierError> {
        if self.config.webhook_url.is_empty() {
            return Err(NotifierError::Config("slack webhook_url is empty".to_string()));
        }

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&self.build_payload(message))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifierError::Status(response.status().as_u16()));
        }

        debug!("Slack notification sent for alert {}", message.alert_id);
        Ok(())
    }

    fn name(&self) -> &str {
        "slack"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.webhook_url.trim().is_empty()
    }
}

// ============================================================================
// Webhook 通知
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

pub struct WebhookNotifier {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Result<Self, NotifierError> {
        Ok(Self {
            config,
            client: http_client()?,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &NotifyMessage) -> Result<(), NotifierError> {
        let mut request = self.client.post(&self.config.url);

        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        let response = request.json(message).send().await?;

        if !response.status().is_success() {
            return Err(NotifierError::Status(response.status().as_u16()));
        }

        debug!("Webhook notification sent to {}", self.config.url);
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        !self.config.url.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn sample_message(level: NotifyLevel) -> NotifyMessage {
        let mut fields = BTreeMap::new();
        fields.insert("threshold".to_string(), "80".to_string());
        fields.insert("current".to_string(), "91.2".to_string());

        NotifyMessage {
            alert_id: "a-1".to_string(),
            title: "CPU_HIGH".to_string(),
            content: "CPU usage exceeded 80%: 91.2%".to_string(),
            level,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            fields,
        }
    }

    #[test]
    fn test_slack_payload_format() {
        let notifier = SlackNotifier::new(SlackConfig {
            webhook_url: "https://hooks.slack.com/services/x".to_string(),
            channel: "#ops".to_string(),
            ..SlackConfig::default()
        })
        .unwrap();

        let message = sample_message(NotifyLevel::Critical);
        let payload = serde_json::to_value(notifier.build_payload(&message)).unwrap();

        assert_eq!(payload["channel"], "#ops");
        assert_eq!(payload["username"], "vigil");
        let attachment = &payload["attachments"][0];
        assert_eq!(attachment["color"], "danger");
        assert_eq!(attachment["title"], ":red_circle: [CRITICAL] CPU_HIGH");
        assert_eq!(attachment["ts"], message.timestamp.timestamp().to_string());
        assert_eq!(attachment["fields"][0]["title"], "current");
        assert_eq!(attachment["fields"][1]["title"], "threshold");
        assert_eq!(attachment["fields"][1]["short"], true);
    }

    #[test]
    fn test_slack_warning_color() {
        let notifier = SlackNotifier::new(SlackConfig::default()).unwrap();
        let payload =
            serde_json::to_value(notifier.build_payload(&sample_message(NotifyLevel::Warning)))
                .unwrap();
        assert_eq!(payload["attachments"][0]["color"], "warning");
        assert!(payload["attachments"][0]["title"]
            .as_str()
            .unwrap()
            .starts_with(":warning:"));
    }

    #[test]
    fn test_slack_disabled_without_url() {
        let notifier = SlackNotifier::new(SlackConfig::default()).unwrap();
        assert!(!notifier.is_enabled());

        let notifier = SlackNotifier::new(SlackConfig {
            webhook_url: "https://hooks.slack.com/services/x".to_string(),
            enabled: false,
            ..SlackConfig::default()
        })
        .unwrap();
        assert!(!notifier.is_enabled());
    }

    #[tokio::test]
    async fn test_slack_send_without_url_is_config_error() {
        let notifier = SlackNotifier::new(SlackConfig::default()).unwrap();
        let result = notifier.send(&sample_message(NotifyLevel::Warning)).await;
        assert!(matches!(result, Err(NotifierError::Config(_))));
    }
}
