//! SMS delivery abstraction for one-time codes.
//!
//! The auth flow only needs `send(destination, text) -> ok | fail`. There is
//! no retry here: the caller rolls the MFA challenge back on failure, so a
//! code the user can never receive does not stay live.
//!
//! The default sender for local dev is [`LogSmsSender`], which logs and
//! returns `Ok(())`. Production uses [`TwilioSender`] against the Twilio
//! Messages API.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Deliver a message or return an error so the caller can compensate.
    async fn send(&self, to: &str, body: &str) -> Result<()>;
}

/// Local dev sender that logs the destination instead of sending real SMS.
/// The body is not logged; it carries the one-time code.
#[derive(Clone, Debug)]
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, to: &str, _body: &str) -> Result<()> {
        info!(to = %to, "sms send stub");

        Ok(())
    }
}

/// Twilio Messages API client.
pub struct TwilioSender {
    client: Client,
    account_sid: String,
    auth_token: SecretString,
    from: String,
}

impl TwilioSender {
    pub fn new(account_sid: String, auth_token: SecretString, from: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(SEND_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            account_sid,
            auth_token,
            from,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSender {
    async fn send(&self, to: &str, body: &str) -> Result<()> {
        let params = [("From", self.from.as_str()), ("To", to), ("Body", body)];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response.json().await.unwrap_or(Value::Null);

            let message = json_response["message"].as_str().unwrap_or_default();

            error!("sms delivery failed: {status} {message}");

            return Err(anyhow!("sms delivery failed: {status}"));
        }

        Ok(())
    }
}

/// Records outgoing messages so tests can assert on delivery.
#[cfg(test)]
pub(crate) struct RecordingSmsSender {
    pub(crate) sent: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingSmsSender {
    pub(crate) fn new() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl SmsSender for RecordingSmsSender {
    async fn send(&self, to: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));

        Ok(())
    }
}

/// Always fails, for exercising the challenge rollback path.
#[cfg(test)]
pub(crate) struct FailingSmsSender;

#[cfg(test)]
#[async_trait]
impl SmsSender for FailingSmsSender {
    async fn send(&self, _to: &str, _body: &str) -> Result<()> {
        Err(anyhow!("sms provider unavailable"))
    }
}
