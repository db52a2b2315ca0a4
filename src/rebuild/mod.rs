use async_trait::async_trait;
use derive_more::Display;
use log::{error, info};

#[derive(Debug, Display, Clone, PartialEq)]
#[display(fmt = "Site rebuild failed: {}", _0)]
pub struct TriggerError(pub String);

impl std::error::Error for TriggerError {}

// Asks for the static site to be rebuilt. One call,
// no retries.
#[async_trait]
pub trait RebuildTrigger: Send + Sync {
  async fn trigger(&self) -> Result<(), TriggerError>;
}

// Build hooks (Netlify and friends) just want an
// empty POST.
pub struct WebhookTrigger {
  client: reqwest::Client,
  hook_url: String
}

impl WebhookTrigger {
  pub fn new(hook_url: &str) -> Self {
    Self {
      client: reqwest::Client::new(),
      hook_url: hook_url.to_string()
    }
  }
}

#[async_trait]
impl RebuildTrigger for WebhookTrigger {
  async fn trigger(&self) -> Result<(), TriggerError> {
    let response = self.client
      .post(&self.hook_url)
      .send()
      .await
      .map_err(|e| {
        error!("Build hook is unreachable - {}", e);
        TriggerError(e.to_string())
      })?;
    let status = response.status();
    if status.is_success() {
      info!("Site rebuild requested");
      Ok(())
    } else {
      error!("Build hook answered {}", status);
      Err(TriggerError(format!("build hook answered {}", status)))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::http::StatusCode;
  use crate::pipelines::test_doubles::StubServer;

  #[actix_web::test]
  async fn successful_hook_call_is_ok() {
    let server = StubServer::start(StatusCode::OK, "{}");
    let sut = WebhookTrigger::new(&format!("{}/build_hooks/abc", server.url));
    sut.trigger().await.unwrap();
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/build_hooks/abc");
    assert!(requests[0].body.is_empty());
    server.stop().await;
  }

  #[actix_web::test]
  async fn error_status_is_a_trigger_error() {
    let server = StubServer::start(StatusCode::INTERNAL_SERVER_ERROR, "{}");
    let sut = WebhookTrigger::new(&format!("{}/build_hooks/abc", server.url));
    let err = sut.trigger().await.unwrap_err();
    assert!(err.0.contains("500"), "{}", err);
    assert_eq!(server.requests().len(), 1);
    server.stop().await;
  }

  // Port 9 is discard, nothing should be listening
  // there on a test machine.
  #[actix_web::test]
  async fn unreachable_hook_is_an_error() {
    let sut = WebhookTrigger::new("http://127.0.0.1:9/build_hooks/abc");
    assert!(sut.trigger().await.is_err());
  }

  #[actix_web::test]
  async fn invalid_hook_url_is_an_error() {
    let sut = WebhookTrigger::new("not a url");
    assert!(sut.trigger().await.is_err());
  }
}
