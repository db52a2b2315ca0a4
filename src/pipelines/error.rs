use derive_more::Display;
use handlebars::RenderError;
use crate::db::StoreError;
use crate::notifications::{MailError, NotificationError};
use crate::rebuild::TriggerError;
use crate::validation::ValidationError;

// Single error channel for all the pipelines. The
// first step that fails decides which one we get.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum PipelineError {
  #[display(fmt = "{}", _0)]
  Validation(String),
  #[display(fmt = "{}", _0)]
  NotFound(String),
  #[display(fmt = "Store error: {}", _0)]
  Store(String),
  #[display(fmt = "Mail error: {}", _0)]
  Mail(String),
  #[display(fmt = "Rebuild trigger error: {}", _0)]
  Trigger(String),
  #[display(fmt = "Unknown error: {}", _0)]
  Unknown(String)
}

impl std::error::Error for PipelineError {}

impl PipelineError {
  // Errors caused by whatever the client sent us,
  // as opposed to something breaking on our side.
  pub fn is_client_error(&self) -> bool {
    matches!(self, PipelineError::Validation(_) | PipelineError::NotFound(_))
  }
}

impl From<ValidationError> for PipelineError {
  fn from(e: ValidationError) -> Self {
    PipelineError::Validation(e.0)
  }
}

impl From<StoreError> for PipelineError {
  fn from(e: StoreError) -> Self {
    match e {
      StoreError::NotFound(id) => PipelineError::NotFound(
        format!("Comment {} does not exist", id)
      ),
      StoreError::Backend(msg) => PipelineError::Store(msg)
    }
  }
}

impl From<MailError> for PipelineError {
  fn from(e: MailError) -> Self {
    PipelineError::Mail(e.0)
  }
}

impl From<RenderError> for PipelineError {
  fn from(e: RenderError) -> Self {
    PipelineError::Unknown(e.to_string())
  }
}

impl From<NotificationError> for PipelineError {
  fn from(e: NotificationError) -> Self {
    match e {
      NotificationError::Render(e) => e.into(),
      NotificationError::Mail(e) => e.into()
    }
  }
}

impl From<TriggerError> for PipelineError {
  fn from(e: TriggerError) -> Self {
    PipelineError::Trigger(e.0)
  }
}
