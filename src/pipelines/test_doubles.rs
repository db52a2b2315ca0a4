// Stand-ins for the outside world, test builds only.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use async_trait::async_trait;
use crate::notifications::{Mailer, MailError, SendReceipt};
use crate::rebuild::{RebuildTrigger, TriggerError};

#[derive(Debug, Clone)]
pub struct SentMail {
  pub subject: String,
  pub to: String,
  pub html: String
}

enum MailerBehavior {
  Deliver,
  FailAll,
  FailFor(String)
}

// Keeps everything it was asked to send. Failed
// sends are not recorded.
pub struct RecordingMailer {
  sent: Mutex<Vec<SentMail>>,
  behavior: MailerBehavior
}

impl RecordingMailer {
  pub fn new() -> Self {
    Self::with_behavior(MailerBehavior::Deliver)
  }

  pub fn failing() -> Self {
    Self::with_behavior(MailerBehavior::FailAll)
  }

  pub fn failing_for(address: &str) -> Self {
    Self::with_behavior(MailerBehavior::FailFor(address.to_string()))
  }

  fn with_behavior(behavior: MailerBehavior) -> Self {
    Self {
      sent: Mutex::new(Vec::new()),
      behavior
    }
  }

  pub fn sent(&self) -> Vec<SentMail> {
    self.sent.lock().unwrap().clone()
  }
}

#[async_trait]
impl Mailer for RecordingMailer {
  async fn send(
    &self,
    subject: &str,
    to_email: &str,
    html: &str
  ) -> Result<SendReceipt, MailError> {
    let fails = match &self.behavior {
      MailerBehavior::Deliver => false,
      MailerBehavior::FailAll => true,
      MailerBehavior::FailFor(address) => address == to_email
    };
    if fails {
      return Err(MailError(format!("refusing to mail {}", to_email)));
    }
    let mut sent = self.sent.lock().unwrap();
    sent.push(SentMail {
      subject: subject.to_string(),
      to: to_email.to_string(),
      html: html.to_string()
    });
    Ok(SendReceipt {
      id: format!("<{}@test>", sent.len()),
      message: "Queued".to_string()
    })
  }
}

// Counts calls, failed ones included.
pub struct CountingTrigger {
  calls: AtomicUsize,
  fail: bool
}

impl CountingTrigger {
  pub fn new() -> Self {
    Self { calls: AtomicUsize::new(0), fail: false }
  }

  pub fn failing() -> Self {
    Self { calls: AtomicUsize::new(0), fail: true }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl RebuildTrigger for CountingTrigger {
  async fn trigger(&self) -> Result<(), TriggerError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail {
      Err(TriggerError("build hook answered 500".to_string()))
    } else {
      Ok(())
    }
  }
}

#[derive(Debug, Clone)]
pub struct StubRequest {
  pub method: String,
  pub path: String,
  pub authorization: Option<String>,
  pub body: String
}

// A real HTTP server on a random local port that
// answers every request with the same status and
// body, for the transports that talk to Mailgun or
// a build hook.
pub struct StubServer {
  pub url: String,
  requests: Arc<Mutex<Vec<StubRequest>>>,
  handle: ServerHandle
}

impl StubServer {
  pub fn start(status: StatusCode, answer: &'static str) -> Self {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();
    let server = HttpServer::new(move || {
      let recorded = recorded.clone();
      App::new().default_service(web::to(move |req: HttpRequest, body: String| {
        let recorded = recorded.clone();
        async move {
          recorded.lock().unwrap().push(StubRequest {
            method: req.method().to_string(),
            path: req.path().to_string(),
            authorization: req.headers()
              .get("authorization")
              .and_then(|v| v.to_str().ok())
              .map(String::from),
            body
          });
          HttpResponse::build(status)
            .content_type("application/json")
            .body(answer)
        }
      }))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .unwrap();
    let url = format!("http://{}", server.addrs()[0]);
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    Self { url, requests, handle }
  }

  pub fn requests(&self) -> Vec<StubRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub async fn stop(self) {
    self.handle.stop(false).await;
  }
}
