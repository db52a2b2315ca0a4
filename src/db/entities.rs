use serde::{Deserialize, Serialize};

// Field names are the ones the front-end widget
// and the old document store were using, hence
// the snake_case timestamps in the JSON.

// A comment as it lives in the store. Timestamps
// are epoch milliseconds.
// responses is None when nobody replied, which
// serializes to null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
  pub id: String,
  pub path: String,
  pub email: String,
  pub name: String,
  pub comment: String,
  pub approved: bool,
  pub created_at: i64,
  pub updated_at: i64,
  pub responses: Option<Vec<Comment>>
}

// Same thing without the id, that's what we hand
// over to the store for insertion. Replies can't
// be created through here, so there's no
// responses field at all (always stored as null).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddComment {
  pub path: String,
  pub email: String,
  pub name: String,
  pub comment: String,
  pub approved: bool,
  pub created_at: i64,
  pub updated_at: i64
}

// What the store gives back after an insert.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReference {
  pub id: String
}

#[cfg(test)]
impl Comment {
  pub fn from_add_comment(id: String, add_comment: AddComment) -> Self {
    Self {
      id,
      path: add_comment.path,
      email: add_comment.email,
      name: add_comment.name,
      comment: add_comment.comment,
      approved: add_comment.approved,
      created_at: add_comment.created_at,
      updated_at: add_comment.updated_at,
      responses: None
    }
  }
}
