pub mod webhook;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::{Booking, Client, PrizeSpec};

/// Something the salon's automation workflows react to.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutomationEvent {
    NewBooking {
        booking: Booking,
        customer: Option<Client>,
        loyalty_points: i64,
    },
    BookingCancelled {
        booking: Booking,
    },
    LoyaltyReward {
        user_id: String,
        prize: PrizeSpec,
    },
    HealthCheck,
}

impl AutomationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AutomationEvent::NewBooking { .. } => "new_booking",
            AutomationEvent::BookingCancelled { .. } => "booking_cancelled",
            AutomationEvent::LoyaltyReward { .. } => "loyalty_reward",
            AutomationEvent::HealthCheck => "health_check",
        }
    }
}

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn notify(&self, event: &AutomationEvent) -> anyhow::Result<()>;

    /// True when events are handled in-process rather than sent anywhere.
    fn is_local(&self) -> bool {
        false
    }
}

/// Used when no automation endpoint is configured.
pub struct LocalGateway;

#[async_trait]
impl NotificationGateway for LocalGateway {
    async fn notify(&self, event: &AutomationEvent) -> anyhow::Result<()> {
        tracing::debug!(event = event.kind(), "automation not configured, handled locally");
        Ok(())
    }

    fn is_local(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Delivered,
    Local,
    /// The gateway failed or timed out. Never affects the operation that triggered it.
    Unavailable { reason: String },
}

/// One attempt, bounded by `timeout`, no retry. Failures are logged and
/// reported back as a soft warning.
pub async fn dispatch(
    gateway: &dyn NotificationGateway,
    event: &AutomationEvent,
    timeout: Duration,
) -> NotificationOutcome {
    match tokio::time::timeout(timeout, gateway.notify(event)).await {
        Ok(Ok(())) if gateway.is_local() => NotificationOutcome::Local,
        Ok(Ok(())) => {
            tracing::info!(event = event.kind(), "automation event delivered");
            NotificationOutcome::Delivered
        }
        Ok(Err(e)) => {
            tracing::warn!(event = event.kind(), error = %e, "automation gateway unavailable");
            NotificationOutcome::Unavailable {
                reason: e.to_string(),
            }
        }
        Err(_) => {
            tracing::warn!(
                event = event.kind(),
                timeout_ms = timeout.as_millis() as u64,
                "automation gateway timed out"
            );
            NotificationOutcome::Unavailable {
                reason: format!("timed out after {}ms", timeout.as_millis()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingGateway;

    #[async_trait]
    impl NotificationGateway for FailingGateway {
        async fn notify(&self, _event: &AutomationEvent) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    struct SlowGateway;

    #[async_trait]
    impl NotificationGateway for SlowGateway {
        async fn notify(&self, _event: &AutomationEvent) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_local_gateway_reports_local() {
        let outcome =
            dispatch(&LocalGateway, &AutomationEvent::HealthCheck, Duration::from_secs(1)).await;
        assert_eq!(outcome, NotificationOutcome::Local);
    }

    #[tokio::test]
    async fn test_failure_is_downgraded() {
        let outcome = dispatch(
            &FailingGateway,
            &AutomationEvent::HealthCheck,
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(
            outcome,
            NotificationOutcome::Unavailable {
                reason: "connection refused".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_timeout_is_downgraded() {
        let outcome = dispatch(
            &SlowGateway,
            &AutomationEvent::HealthCheck,
            Duration::from_millis(50),
        )
        .await;
        assert!(matches!(outcome, NotificationOutcome::Unavailable { .. }));
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(AutomationEvent::HealthCheck).unwrap();
        assert_eq!(json["type"], "health_check");
    }
}
