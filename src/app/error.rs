use actix_web::{
  error::ResponseError,
  http::StatusCode,
  HttpResponse
};
use derive_more::Display;
use serde::Serialize;
use crate::pipelines::PipelineError;

// The full error message for anything that broke on
// our side only shows up in the logs (the pipelines
// log it). Internet people get a short reason.
#[derive(Debug, Display)]
pub enum Error {
  #[display(fmt = "Internal Server Error: {}", _0)]
  InternalServerError(String),
  #[display(fmt = "Not Found: {}", _0)]
  NotFound(String),
  #[display(fmt = "Bad Request: {}", _0)]
  BadRequest(String)
}

impl From<PipelineError> for Error {
  fn from(e: PipelineError) -> Self {
    match e {
      PipelineError::Validation(msg) => Error::BadRequest(msg),
      PipelineError::NotFound(msg) => Error::NotFound(msg),
      PipelineError::Store(_) => Error::InternalServerError(
        "comment store unavailable".to_string()
      ),
      PipelineError::Mail(_) => Error::InternalServerError(
        "could not send email".to_string()
      ),
      PipelineError::Trigger(_) => Error::InternalServerError(
        "could not request a site rebuild".to_string()
      ),
      PipelineError::Unknown(_) => Error::InternalServerError(
        "unexpected error".to_string()
      )
    }
  }
}

// Plain text for most endpoints, like the old API.
impl ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self {
      Error::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST
    }
  }

  fn error_response(&self) -> HttpResponse {
    HttpResponse::build(self.status_code())
      .content_type("text/plain; charset=utf-8")
      .body(self.to_string())
  }
}

// The comment form endpoint answers in JSON instead,
// the widget reads the "error" field.
#[derive(Debug, Display)]
#[display(fmt = "{}", _0)]
pub struct JsonError(pub Error);

#[derive(Serialize)]
struct ErrorBody {
  error: String
}

impl From<PipelineError> for JsonError {
  fn from(e: PipelineError) -> Self {
    JsonError(e.into())
  }
}

impl ResponseError for JsonError {
  fn status_code(&self) -> StatusCode {
    self.0.status_code()
  }

  fn error_response(&self) -> HttpResponse {
    HttpResponse::build(self.status_code())
      .json(ErrorBody { error: self.0.to_string() })
  }
}
