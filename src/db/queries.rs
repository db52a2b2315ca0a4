// Every SQL statement the store uses lives in
// here. I gave up on building queries with a
// builder, there's only one table anyway.

pub const CREATE_COMMENTS_TABLE: &'static str =
  "CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY NOT NULL,
    path TEXT NOT NULL,
    email TEXT NOT NULL,
    name TEXT NOT NULL,
    comment TEXT NOT NULL,
    approved INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    responses TEXT
  );
  CREATE INDEX IF NOT EXISTS comments_email_idx ON comments (email);
  CREATE INDEX IF NOT EXISTS comments_approved_idx ON comments (approved);";

pub const COMMENT_FIELDS: &'static str =
  "id, path, email, name, comment, approved, created_at, updated_at, responses";

// New comments never have responses, so no need
// to insert that column.
pub const INSERT_COMMENT: &'static str =
  "INSERT INTO comments
  (id, path, email, name, comment, approved, created_at, updated_at)
  VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

pub const COUNT_BY_ID: &'static str =
  "SELECT count(*) FROM comments WHERE id = ?1";

// Only touching rows that aren't approved yet
// makes approving twice a no-op.
pub const APPROVE_COMMENT: &'static str =
  "UPDATE comments SET approved = 1, updated_at = ?1
  WHERE id = ?2 AND approved = 0";

pub const DELETE_COMMENT: &'static str =
  "DELETE FROM comments WHERE id = ?1";

pub fn select_by_id() -> String {
  format!("SELECT {} FROM comments WHERE id = ?1", COMMENT_FIELDS)
}

pub fn select_approved() -> String {
  format!(
    "SELECT {} FROM comments WHERE approved = 1 ORDER BY created_at ASC",
    COMMENT_FIELDS
  )
}

pub fn select_by_email() -> String {
  format!(
    "SELECT {} FROM comments WHERE email = ?1 ORDER BY created_at ASC",
    COMMENT_FIELDS
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn select_by_email_filters_and_orders() {
    let expected = String::from(
      "SELECT id, path, email, name, comment, approved, created_at, updated_at, responses \
      FROM comments WHERE email = ?1 ORDER BY created_at ASC"
    );
    assert_eq!(select_by_email(), expected);
  }
}
