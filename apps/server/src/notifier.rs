//! # Reminder Notifier
//!
//! Posts [`ReminderPayload`] JSON to the webhook configured in Settings.
//! Whatever sits behind the webhook (mail relay, SMS gateway, automation
//! tool) does the actual chasing.
//!
//! ## Retry Policy
//! ```text
//! attempt 1 ──► 2xx ──► done
//!    │
//!    ├──► 5xx / 429 / timeout / connect error ──► wait (exponential) ──► attempt 2 ...
//!    │
//!    └──► other 4xx ──► give up (NotifyError::Rejected)
//!
//! after max_attempts transient failures ──► NotifyError::Failed
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backoff::ExponentialBackoff;
use parlour_core::reminders::ReminderPayload;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// No webhook URL in Settings.
    #[error("No reminder webhook is configured")]
    NotConfigured,

    #[error("Invalid webhook URL: {0}")]
    InvalidUrl(String),

    /// The endpoint answered with a status that retrying will not fix.
    #[error("Webhook rejected the reminder with HTTP {status}")]
    Rejected { status: u16 },

    #[error("Webhook failed after {attempts} attempts: {message}")]
    Failed { attempts: u32, message: String },

    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Outcome of a delivered reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub status: u16,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct ReminderNotifier {
    client: reqwest::Client,
    max_attempts: u32,
    initial_interval: Duration,
}

impl ReminderNotifier {
    pub fn new(timeout: Duration, max_attempts: u32) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("parlour/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;

        Ok(ReminderNotifier {
            client,
            max_attempts: max_attempts.max(1),
            initial_interval: Duration::from_millis(500),
        })
    }

    /// Shortens the first retry delay (later delays double from it).
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    fn policy(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.initial_interval * 8,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Posts the reminder to `webhook_url`.
    pub async fn send(
        &self,
        webhook_url: Option<&str>,
        payload: &ReminderPayload,
    ) -> Result<Delivery, NotifyError> {
        let raw = webhook_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(NotifyError::NotConfigured)?;
        let url = Url::parse(raw).map_err(|e| NotifyError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(NotifyError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let attempts = AtomicU32::new(0);
        let max_attempts = self.max_attempts;

        let result = backoff::future::retry(self.policy(), || {
            let url = url.clone();
            let attempts = &attempts;
            async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(invoice = %payload.invoice_number, attempt, "Posting reminder webhook");

                let outcome = self.client.post(url).json(payload).send().await;
                let error = match outcome {
                    Ok(response) if response.status().is_success() => {
                        return Ok(response.status().as_u16());
                    }
                    Ok(response) if is_retryable(response.status()) => NotifyError::Rejected {
                        status: response.status().as_u16(),
                    },
                    Ok(response) => {
                        return Err(backoff::Error::permanent(NotifyError::Rejected {
                            status: response.status().as_u16(),
                        }));
                    }
                    Err(e) => NotifyError::Client(e.to_string()),
                };

                if attempt >= max_attempts {
                    Err(backoff::Error::permanent(NotifyError::Failed {
                        attempts: attempt,
                        message: error.to_string(),
                    }))
                } else {
                    warn!(attempt, error = %error, "Reminder webhook failed, retrying");
                    Err(backoff::Error::transient(error))
                }
            }
        })
        .await;

        let attempts = attempts.load(Ordering::SeqCst);
        match result {
            Ok(status) => {
                info!(
                    invoice = %payload.invoice_number,
                    status,
                    attempts,
                    "Reminder delivered"
                );
                Ok(Delivery { status, attempts })
            }
            Err(e) => {
                warn!(invoice = %payload.invoice_number, attempts, error = %e, "Reminder not delivered");
                Err(e)
            }
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::{NaiveDate, Utc};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    fn payload() -> ReminderPayload {
        ReminderPayload {
            event: "invoice.reminder".to_string(),
            invoice_id: "inv-1".to_string(),
            invoice_number: "INV-2026-0007".to_string(),
            customer_name: "Hill Farm".to_string(),
            customer_email: Some("rhys@example.com".to_string()),
            amount_due_pence: 12_000,
            amount_due: "£120.00".to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            days_overdue: 4,
            company_name: "Parlour Services Ltd".to_string(),
            sent_at: Utc::now(),
        }
    }

    #[derive(Default)]
    struct Hook {
        received: Mutex<Vec<serde_json::Value>>,
        failures_left: Mutex<u32>,
        status_on_failure: u16,
    }

    async fn hook_handler(
        State(hook): State<Arc<Hook>>,
        Json(body): Json<serde_json::Value>,
    ) -> AxumStatus {
        let mut failures = hook.failures_left.lock().await;
        if *failures > 0 {
            *failures -= 1;
            return AxumStatus::from_u16(hook.status_on_failure).unwrap();
        }
        hook.received.lock().await.push(body);
        AxumStatus::NO_CONTENT
    }

    /// Starts a local webhook receiver and returns its URL.
    async fn spawn_hook(hook: Arc<Hook>) -> String {
        let app = Router::new()
            .route("/hook", post(hook_handler))
            .with_state(hook);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{addr}/hook")
    }

    fn notifier() -> ReminderNotifier {
        ReminderNotifier::new(Duration::from_secs(5), 3)
            .unwrap()
            .with_initial_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_delivers_payload() {
        let hook = Arc::new(Hook::default());
        let url = spawn_hook(hook.clone()).await;

        let delivery = notifier().send(Some(&url), &payload()).await.unwrap();
        assert_eq!(delivery.status, 204);
        assert_eq!(delivery.attempts, 1);

        let received = hook.received.lock().await;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["event"], "invoice.reminder");
        assert_eq!(received[0]["invoiceNumber"], "INV-2026-0007");
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let hook = Arc::new(Hook {
            failures_left: Mutex::new(2),
            status_on_failure: 503,
            ..Default::default()
        });
        let url = spawn_hook(hook.clone()).await;

        let delivery = notifier().send(Some(&url), &payload()).await.unwrap();
        assert_eq!(delivery.attempts, 3);
        assert_eq!(hook.received.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let hook = Arc::new(Hook {
            failures_left: Mutex::new(10),
            status_on_failure: 500,
            ..Default::default()
        });
        let url = spawn_hook(hook.clone()).await;

        let err = notifier().send(Some(&url), &payload()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Failed { attempts: 3, .. }));
        assert_eq!(*hook.failures_left.lock().await, 7);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let hook = Arc::new(Hook {
            failures_left: Mutex::new(10),
            status_on_failure: 400,
            ..Default::default()
        });
        let url = spawn_hook(hook.clone()).await;

        let err = notifier().send(Some(&url), &payload()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected { status: 400 }));
        assert_eq!(*hook.failures_left.lock().await, 9);
    }

    #[tokio::test]
    async fn test_missing_or_bad_url() {
        let n = notifier();
        assert!(matches!(
            n.send(None, &payload()).await,
            Err(NotifyError::NotConfigured)
        ));
        assert!(matches!(
            n.send(Some("  "), &payload()).await,
            Err(NotifyError::NotConfigured)
        ));
        assert!(matches!(
            n.send(Some("ftp://example.com/hook"), &payload()).await,
            Err(NotifyError::InvalidUrl(_))
        ));
    }
}
