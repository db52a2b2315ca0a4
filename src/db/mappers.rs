use super::entities::*;
use rusqlite::{Row, Error};
use rusqlite::types::Type;
use serde_json::{json, Value};
use crate::validation::{decode_comment, ValidationError};

// Column order has to match COMMENT_FIELDS in the
// queries module.
// Rows go through the same validation as what comes
// in over HTTP, a broken row is an error, not a
// half-filled Comment.
pub fn map_comment(row: &Row) -> Result<Comment, Error> {
  let id: String = row.get(0)?;
  let path: String = row.get(1)?;
  let email: String = row.get(2)?;
  let name: String = row.get(3)?;
  let comment: String = row.get(4)?;
  let approved: bool = row.get(5)?;
  let created_at: i64 = row.get(6)?;
  let updated_at: i64 = row.get(7)?;
  let responses_json: Option<String> = row.get(8)?;
  let responses = match responses_json {
    Some(json) => serde_json::from_str(&json)
      .map_err(|e| Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?,
    None => Value::Null
  };
  let document = json!({
    "id": id,
    "path": path,
    "email": email,
    "name": name,
    "comment": comment,
    "approved": approved,
    "created_at": created_at,
    "updated_at": updated_at,
    "responses": responses
  });
  decode_comment(&document).map_err(invalid_row)
}

fn invalid_row(e: ValidationError) -> Error {
  Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
}
