use actix_web::{web, HttpResponse, Result};
use serde::Serialize;
use serde_json::Value;
use super::error::{Error, JsonError};
use super::AppState;

// Module with all the API handler functions. They
// only unpack the request, run a pipeline and turn
// the outcome into a response.

#[derive(Serialize)]
pub struct SuccessBody {
  pub success: bool
}

fn text(body: String) -> HttpResponse {
  HttpResponse::Ok()
    .content_type("text/plain; charset=utf-8")
    .body(body)
}

// Default response when no route matched the request:
pub async fn not_found() -> Result<HttpResponse, Error> {
  Err(Error::NotFound(String::from("Endpoint doesn't exist")))
}

pub async fn approved_comments(
  app_state: web::Data<AppState>
) -> Result<HttpResponse, Error> {
  let comments = app_state.pipelines.list_approved_comments().await?;
  Ok(HttpResponse::Ok().json(comments))
}

// Takes the raw JSON, the pipeline does all the
// validation.
pub async fn new_comment(
  app_state: web::Data<AppState>,
  body: web::Json<Value>
) -> Result<HttpResponse, JsonError> {
  app_state.pipelines.create_comment(&body).await?;
  Ok(HttpResponse::Ok().json(SuccessBody { success: true }))
}

// Path variables have to be in a tuple.
pub async fn approval(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>
) -> Result<HttpResponse, Error> {
  let comment_id = path.into_inner().0;
  app_state.pipelines.approve_comment(&comment_id).await?;
  Ok(text(String::from("Comment approved, thank you!")))
}

pub async fn delete(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>
) -> Result<HttpResponse, Error> {
  let comment_id = path.into_inner().0;
  app_state.pipelines.delete_comment(&comment_id).await?;
  Ok(text(String::from("Comment deleted")))
}

pub async fn request_delete(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>
) -> Result<HttpResponse, Error> {
  let email = path.into_inner().0;
  let count = app_state.pipelines.request_bulk_deletion(&email).await?;
  Ok(text(format!(
    "An email with deletion links for {} comment(s) was sent to {}",
    count,
    email
  )))
}
