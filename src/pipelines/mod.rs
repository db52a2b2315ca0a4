/*
 * The comment workflows. Each one is a straight
 * chain of steps over PipelineError: the first step
 * that fails ends the pipeline and its error is the
 * result. No retries, no rollbacks, no steps running
 * at the same time.
 */

use std::sync::Arc;
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use crate::db::CommentStore;
use crate::db::entities::Comment;
use crate::notifications::NotificationService;
use crate::rebuild::RebuildTrigger;
use crate::utils::time_utils::current_timestamp_millis;
use crate::validation::{self, ValidationError};
mod error;
#[cfg(test)]
pub mod test_doubles;
pub use error::PipelineError;

// Fields we take from a comment form, anything else
// in there is ignored.
const FORM_FIELDS: [&'static str; 4] = ["path", "email", "name", "comment"];

pub struct Pipelines {
  store: Arc<dyn CommentStore>,
  notifications: NotificationService,
  rebuild: Arc<dyn RebuildTrigger>
}

impl Pipelines {

  pub fn new(
    store: Arc<dyn CommentStore>,
    notifications: NotificationService,
    rebuild: Arc<dyn RebuildTrigger>
  ) -> Self {
    Self {
      store,
      notifications,
      rebuild
    }
  }

  // validate -> persist -> fetch what got stored ->
  // confirmation email.
  // If the email fails the comment stays in the store,
  // unapproved, and we still report the failure.
  pub async fn create_comment(&self, raw: &Value) -> Result<Comment, PipelineError> {
    debug!("CreateComment: validating");
    report("CreateComment", self.create_steps(raw).await)
  }

  // The rebuild is requested before flipping the flag,
  // if it fails the comment stays unapproved.
  pub async fn approve_comment(&self, id: &str) -> Result<(), PipelineError> {
    debug!("ApproveComment: validating {}", id);
    report("ApproveComment", self.approve_steps(id).await)
  }

  // Unlike approval, the rebuild comes after the
  // store change here. A failed rebuild leaves the
  // comment deleted.
  pub async fn delete_comment(&self, id: &str) -> Result<(), PipelineError> {
    debug!("DeleteComment: validating {}", id);
    report("DeleteComment", self.delete_steps(id).await)
  }

  // Sends one email with a delete link for every
  // comment posted with that address. Gives back how
  // many comments were in there.
  pub async fn request_bulk_deletion(&self, email: &str) -> Result<usize, PipelineError> {
    debug!("RequestBulkDeletion: validating {}", email);
    report("RequestBulkDeletion", self.bulk_deletion_steps(email).await)
  }

  pub async fn list_approved_comments(&self) -> Result<Vec<Comment>, PipelineError> {
    debug!("ListApprovedComments");
    let result = self.store.list_approved()
      .await
      .map_err(PipelineError::from);
    report("ListApprovedComments", result)
  }

  async fn create_steps(&self, raw: &Value) -> Result<Comment, PipelineError> {
    let document = new_comment_document(raw, current_timestamp_millis())?;
    let add_comment = validation::decode_add_comment(&document)?;
    let reference = self.store.create(add_comment).await?;
    let comment = self.store.get(&reference.id).await?;
    let receipt = self.notifications.send_confirmation(&comment).await?;
    debug!("Confirmation for {} handed to the mailer: {}", comment.id, receipt.id);
    // The owner alert is best effort.
    if let Err(e) = self.notifications.send_owner_alert(&comment).await {
      error!("Could not send the new comment alert for {} - {}", comment.id, e);
    }
    info!("Comment {} created on {}, waiting for confirmation", comment.id, comment.path);
    Ok(comment)
  }

  async fn approve_steps(&self, id: &str) -> Result<(), PipelineError> {
    let id = validation::validate_comment_id(id)?;
    self.ensure_exists(&id).await?;
    self.rebuild.trigger().await?;
    self.store.approve(&id).await?;
    info!("Comment {} approved", id);
    Ok(())
  }

  async fn delete_steps(&self, id: &str) -> Result<(), PipelineError> {
    let id = validation::validate_comment_id(id)?;
    self.ensure_exists(&id).await?;
    self.store.delete(&id).await?;
    info!("Comment {} deleted", id);
    self.rebuild.trigger().await?;
    Ok(())
  }

  async fn bulk_deletion_steps(&self, email: &str) -> Result<usize, PipelineError> {
    let email = validation::validate_email(email)?;
    let comments = self.store.list_by_email(&email).await?;
    if comments.is_empty() {
      return Err(PipelineError::NotFound(
        format!("No comments found for {}", email)
      ));
    }
    let receipt = self.notifications.send_bulk_deletion(&email, &comments).await?;
    debug!("Deletion links handed to the mailer: {}", receipt.id);
    info!("Sent deletion links for {} comment(s)", comments.len());
    Ok(comments.len())
  }

  async fn ensure_exists(&self, id: &str) -> Result<(), PipelineError> {
    if self.store.exists(id).await? {
      Ok(())
    } else {
      Err(PipelineError::NotFound(format!("Comment {} does not exist", id)))
    }
  }

}

// Builds the full document for a new comment out
// of the submitted form. Validation happens after,
// on the whole thing.
fn new_comment_document(raw: &Value, now: i64) -> Result<Value, ValidationError> {
  let form = raw.as_object()
    .ok_or_else(|| ValidationError("comment form must be a JSON object".to_string()))?;
  let mut document: Map<String, Value> = FORM_FIELDS.iter()
    .filter_map(|&key| form.get(key).map(|v| (key.to_string(), v.clone())))
    .collect();
  document.insert("approved".to_string(), Value::Bool(false));
  document.insert("created_at".to_string(), Value::from(now));
  document.insert("updated_at".to_string(), Value::from(now));
  document.insert("responses".to_string(), Value::Null);
  Ok(Value::Object(document))
}

fn report<T>(pipeline: &str, result: Result<T, PipelineError>) -> Result<T, PipelineError> {
  match &result {
    Err(e) if e.is_client_error() => warn!("{} rejected - {}", pipeline, e),
    Err(e) => error!("{} failed - {}", pipeline, e),
    Ok(_) => debug!("{} completed", pipeline)
  }
  result
}
