// Adding the context method to errors:
use eyre::WrapErr;
use color_eyre::Result;
use serde::Deserialize;
use std::convert::From;

#[derive(Debug, Deserialize)]
pub struct Config {
  pub bind_address: String,
  pub db_path: String,
  // Root URL of this service as seen from the
  // outside, approve and delete links start with it.
  pub public_url: String,
  pub site_name: String,
  pub owner_email: Option<String>,
  // Mailgun settings:
  pub mail_from: String,
  pub mailgun_host: String,
  pub mailgun_domain: String,
  pub mailgun_api_key: String,
  pub rebuild_hook_url: String
}

// What the notification service needs to know about
// the site.
#[derive(Debug, Clone)]
pub struct SiteInfo {
  pub name: String,
  pub public_url: String,
  pub owner_email: Option<String>
}

#[derive(Debug, Clone)]
pub struct MailgunSettings {
  pub host: String,
  pub domain: String,
  pub api_key: String,
  pub from: String
}

// Trailing slashes would give us double slashes in
// the emailed links.
impl From<&Config> for SiteInfo {
  fn from(config: &Config) -> Self {
    Self {
      name: config.site_name.clone(),
      public_url: config.public_url.trim_end_matches('/').to_string(),
      owner_email: config.owner_email.clone()
        .filter(|email| !email.trim().is_empty())
    }
  }
}

impl From<&Config> for MailgunSettings {
  fn from(config: &Config) -> Self {
    Self {
      host: config.mailgun_host.clone(),
      domain: config.mailgun_domain.clone(),
      api_key: config.mailgun_api_key.clone(),
      from: config.mail_from.clone()
    }
  }
}

impl Config {

  pub fn from_env() -> Result<Config> {
    Self::from_source(config::Environment::default())
  }

  // You have to use lowercase when compared to
  // what's in the .env file.
  // Secrets (mailgun key and the build hook) have
  // no default and make startup fail when missing.
  fn from_source<S>(source: S) -> Result<Config>
    where S: config::Source + Send + Sync + 'static
  {
    config::Config::builder()
      .set_default("bind_address", "127.0.0.1:8080")?
      .set_default("db_path", "./comments.sqlite")?
      .set_default("public_url", "http://localhost:8080")?
      .set_default("site_name", "my blog")?
      .set_default("mail_from", "Blog comments <noreply@localhost>")?
      .set_default("mailgun_host", "api.eu.mailgun.net")?
      .add_source(source)
      .build()
      .context("Reading configuration from env")?
      .try_deserialize()
      .context("Loading configuration from env")
  }

}
