use async_trait::async_trait;
use log::{debug, error};
use crate::config::MailgunSettings;
use super::{Mailer, MailError, SendReceipt};

// Talks to the Mailgun HTTP API directly, it's just
// a form POST with basic auth.
pub struct MailgunMailer {
  client: reqwest::Client,
  endpoint: String,
  api_key: String,
  from: String
}

impl MailgunMailer {
  pub fn new(settings: &MailgunSettings) -> Self {
    Self::with_base_url(&format!("https://{}", settings.host), settings)
  }

  // base_url is scheme and host, without the
  // trailing slash.
  pub fn with_base_url(base_url: &str, settings: &MailgunSettings) -> Self {
    Self {
      client: reqwest::Client::new(),
      endpoint: messages_endpoint(base_url, &settings.domain),
      api_key: settings.api_key.clone(),
      from: settings.from.clone()
    }
  }
}

fn messages_endpoint(base_url: &str, domain: &str) -> String {
  format!("{}/v3/{}/messages", base_url, domain)
}

#[async_trait]
impl Mailer for MailgunMailer {
  async fn send(
    &self,
    subject: &str,
    to_email: &str,
    html: &str
  ) -> Result<SendReceipt, MailError> {
    debug!("Sending \"{}\" to {}", subject, to_email);
    let response = self.client
      .post(&self.endpoint)
      .basic_auth("api", Some(&self.api_key))
      .form(&[
        ("from", self.from.as_str()),
        ("to", to_email),
        ("subject", subject),
        ("html", html)
      ])
      .send()
      .await
      .map_err(|e| {
        error!("Could not reach Mailgun - {}", e);
        MailError(e.to_string())
      })?;

    let status = response.status();
    if !status.is_success() {
      // Mailgun explains itself in the body, good
      // to have in the logs.
      let body = response.text().await.unwrap_or_default();
      error!("Mailgun refused to send \"{}\" - {} - {}", subject, status, body);
      return Err(MailError(format!("Mailgun answered {}", status)));
    }

    response.json::<SendReceipt>()
      .await
      .map_err(|e| {
        error!("Unexpected answer from Mailgun - {}", e);
        MailError(e.to_string())
      })
  }
}
