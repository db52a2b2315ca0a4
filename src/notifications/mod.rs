/*
 * Builds the emails out of the handlebars templates
 * and hands them over to whatever Mailer we were
 * given.
 */

use std::sync::Arc;
use async_trait::async_trait;
use derive_more::{Display, From};
use handlebars::{Handlebars, RenderError, TemplateError};
use serde::{Deserialize, Serialize};
use crate::config::SiteInfo;
use crate::db::entities::Comment;
use crate::utils::time_utils::timestamp_millis_to_date_string;
pub mod mailgun;

const CONFIRMATION_TEMPLATE: &'static str = "confirm_comment";
const DELETION_TEMPLATE: &'static str = "delete_comments";
const ALERT_TEMPLATE: &'static str = "new_comment_alert";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SendReceipt {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub message: String
}

#[derive(Debug, Display, Clone, PartialEq)]
#[display(fmt = "Mail transport failure: {}", _0)]
pub struct MailError(pub String);

impl std::error::Error for MailError {}

#[derive(Debug, Display, From)]
pub enum NotificationError {
  #[display(fmt = "Could not render email: {}", _0)]
  Render(RenderError),
  #[display(fmt = "{}", _0)]
  Mail(MailError)
}

impl std::error::Error for NotificationError {}

/**
 * One fallible call per email. The transport is
 * the only part of the notification system that
 * talks to the outside.
 */
#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(
    &self,
    subject: &str,
    to_email: &str,
    html: &str
  ) -> Result<SendReceipt, MailError>;
}

/* --- Template data --- */
#[derive(Serialize)]
struct ConfirmationEmail<'a> {
  site_name: &'a str,
  name: &'a str,
  comment: &'a str,
  approval_link: String
}

#[derive(Serialize)]
struct DeletionEmail<'a> {
  comments: Vec<DeletionEntry<'a>>
}

#[derive(Serialize)]
struct DeletionEntry<'a> {
  path: &'a str,
  comment: &'a str,
  date: String,
  delete_link: String
}

#[derive(Serialize)]
struct CommentAlert<'a> {
  name: &'a str,
  email: &'a str,
  path: &'a str,
  comment: &'a str
}
/* --- End template data --- */

pub struct NotificationService {
  mailer: Arc<dyn Mailer>,
  templates: Handlebars<'static>,
  site_info: SiteInfo
}

impl NotificationService {

  pub fn new(
    mailer: Arc<dyn Mailer>,
    site_info: SiteInfo
  ) -> Result<Self, TemplateError> {
    let mut templates = Handlebars::new();
    // Missing fields should blow up instead of
    // sending half empty emails.
    templates.set_strict_mode(true);
    templates.register_template_string(
      CONFIRMATION_TEMPLATE,
      include_str!("templates/confirm_comment.html.hbs")
    )?;
    templates.register_template_string(
      DELETION_TEMPLATE,
      include_str!("templates/delete_comments.html.hbs")
    )?;
    templates.register_template_string(
      ALERT_TEMPLATE,
      include_str!("templates/new_comment_alert.html.hbs")
    )?;
    Ok(Self {
      mailer,
      templates,
      site_info
    })
  }

  pub fn approval_link(&self, id: &str) -> String {
    format!("{}/approval/{}", self.site_info.public_url, id)
  }

  pub fn delete_link(&self, id: &str) -> String {
    format!("{}/delete/{}", self.site_info.public_url, id)
  }

  pub fn render_confirmation(&self, comment: &Comment) -> Result<String, RenderError> {
    self.templates.render(CONFIRMATION_TEMPLATE, &ConfirmationEmail {
      site_name: &self.site_info.name,
      name: &comment.name,
      comment: &comment.comment,
      approval_link: self.approval_link(&comment.id)
    })
  }

  // Every link in there deletes on a single click,
  // no confirmation page. The email says so.
  pub fn render_bulk_deletion(&self, comments: &[Comment]) -> Result<String, RenderError> {
    self.templates.render(DELETION_TEMPLATE, &DeletionEmail {
      comments: comments.iter()
        .map(|c| DeletionEntry {
          path: &c.path,
          comment: &c.comment,
          date: timestamp_millis_to_date_string(c.created_at),
          delete_link: self.delete_link(&c.id)
        })
        .collect()
    })
  }

  pub fn render_alert(&self, comment: &Comment) -> Result<String, RenderError> {
    self.templates.render(ALERT_TEMPLATE, &CommentAlert {
      name: &comment.name,
      email: &comment.email,
      path: &comment.path,
      comment: &comment.comment
    })
  }

  pub async fn send_confirmation(
    &self,
    comment: &Comment
  ) -> Result<SendReceipt, NotificationError> {
    let html = self.render_confirmation(comment)?;
    let subject = format!("Confirm comment on {}", self.site_info.name);
    Ok(self.mailer.send(&subject, &comment.email, &html).await?)
  }

  pub async fn send_bulk_deletion(
    &self,
    to_email: &str,
    comments: &[Comment]
  ) -> Result<SendReceipt, NotificationError> {
    let html = self.render_bulk_deletion(comments)?;
    let subject = format!("Delete comment on {}", self.site_info.name);
    Ok(self.mailer.send(&subject, to_email, &html).await?)
  }

  // Gives Ok(None) when there's no owner address
  // configured.
  pub async fn send_owner_alert(
    &self,
    comment: &Comment
  ) -> Result<Option<SendReceipt>, NotificationError> {
    let owner_email = match &self.site_info.owner_email {
      Some(email) => email,
      None => return Ok(None)
    };
    let html = self.render_alert(comment)?;
    let subject = format!("{} left a comment on {}", comment.name, self.site_info.name);
    Ok(Some(self.mailer.send(&subject, owner_email, &html).await?))
  }

}
