//! Transactional email client.
//!
//! Order notifications go out through an external email HTTP API. The
//! whole module is best-effort by contract: an order must never fail
//! because a notification could not be delivered, so the dispatch entry
//! point logs failures and swallows them.

pub mod templates;

use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use templates::{admin_notification, customer_confirmation, OrderEmail};

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email delivery is not configured")]
    Disabled,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("email provider rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct Mailer {
    inner: Option<RemoteMailer>,
}

#[derive(Debug, Clone)]
struct RemoteMailer {
    api_url: String,
    api_key: String,
    from: String,
    http: Client,
}

impl Mailer {
    pub fn new(api_url: &str, api_key: &str, from: &str) -> Self {
        Self {
            inner: Some(RemoteMailer {
                api_url: api_url.to_string(),
                api_key: api_key.to_string(),
                from: from.to_string(),
                http: Client::new(),
            }),
        }
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        text: &str,
    ) -> Result<(), EmailError> {
        let remote = self.inner.as_ref().ok_or(EmailError::Disabled)?;

        let body = json!({
            "from": remote.from,
            "to": [to],
            "subject": subject,
            "html": html,
            "text": text,
        });

        let response = remote
            .http
            .post(&remote.api_url)
            .bearer_auth(&remote.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected { status, body });
        }

        Ok(())
    }
}

/// Render and send the customer confirmation and the admin notification
/// for one order. Never fails; delivery problems are logged.
pub async fn dispatch_order_emails(mailer: &Mailer, admin_inbox: Option<&str>, order: &OrderEmail) {
    if !mailer.is_enabled() {
        info!(order_id = %order.order_id, "mailer not configured, skipping order emails");
        return;
    }

    let confirmation = customer_confirmation(order);
    match mailer
        .send(&order.customer_email, &confirmation.subject, &confirmation.html, &confirmation.text)
        .await
    {
        Ok(()) => info!(order_id = %order.order_id, to = %order.customer_email, "customer confirmation sent"),
        Err(err) => warn!(order_id = %order.order_id, error = %err, "customer confirmation email failed"),
    }

    let Some(inbox) = admin_inbox else {
        info!(order_id = %order.order_id, "no admin inbox configured, skipping notification");
        return;
    };

    let notification = admin_notification(order);
    match mailer
        .send(inbox, &notification.subject, &notification.html, &notification.text)
        .await
    {
        Ok(()) => info!(order_id = %order.order_id, to = %inbox, "admin notification sent"),
        Err(err) => warn!(order_id = %order.order_id, error = %err, "admin notification email failed"),
    }
}
