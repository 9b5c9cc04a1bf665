use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use super::{AutomationEvent, NotificationGateway};

const SOURCE: &str = "beauty_salon_app";

pub struct WebhookGateway {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct Envelope<'a> {
    timestamp: String,
    source: &'static str,
    #[serde(flatten)]
    event: &'a AutomationEvent,
}

impl WebhookGateway {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url_for(&self, event: &AutomationEvent) -> String {
        let hook = match event {
            AutomationEvent::NewBooking { .. } | AutomationEvent::BookingCancelled { .. } => {
                "salon-booking"
            }
            AutomationEvent::LoyaltyReward { .. } => "salon-notification",
            AutomationEvent::HealthCheck => "salon-automation",
        };
        format!("{}/webhook/{hook}", self.base_url)
    }
}

#[async_trait]
impl NotificationGateway for WebhookGateway {
    async fn notify(&self, event: &AutomationEvent) -> anyhow::Result<()> {
        let body = Envelope {
            timestamp: chrono::Utc::now().to_rfc3339(),
            source: SOURCE,
            event,
        };

        self.client
            .post(self.url_for(event))
            .json(&body)
            .send()
            .await
            .context("failed to reach automation webhook")?
            .error_for_status()
            .context("automation webhook returned error")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_per_event_kind() {
        let gateway = WebhookGateway::new("https://automation.example.com/".to_string());
        assert_eq!(
            gateway.url_for(&AutomationEvent::HealthCheck),
            "https://automation.example.com/webhook/salon-automation"
        );
    }

    #[test]
    fn test_envelope_flattens_event() {
        let event = AutomationEvent::HealthCheck;
        let envelope = Envelope {
            timestamp: "2025-06-16T10:00:00+00:00".to_string(),
            source: SOURCE,
            event: &event,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "health_check");
        assert_eq!(json["source"], "beauty_salon_app");
    }
}
