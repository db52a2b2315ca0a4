/*
 * Turns raw JSON into typed comments.
 * Everything in here is pure and fails on the
 * first invalid field it finds, no error
 * accumulation.
 */

use derive_more::Display;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use crate::db::entities::{AddComment, Comment};

// Nothing bounds the reply threads in the stored
// documents, so we do it here.
pub const MAX_THREAD_DEPTH: usize = 8;
pub const MAX_ID_LENGTH: usize = 128;
// Names and comment bodies have to be strictly
// longer than this, whitespace included:
const MIN_TEXT_LENGTH: usize = 2;

#[derive(Debug, Display, Clone, PartialEq)]
#[display(fmt = "{}", _0)]
pub struct ValidationError(pub String);

impl std::error::Error for ValidationError {}

lazy_static! {
  static ref EMAIL_REGEX: Regex = Regex::new(
    r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
  ).unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
  EMAIL_REGEX.is_match(email)
}

pub fn validate_email(email: &str) -> Result<String, ValidationError> {
  if is_valid_email(email) {
    Ok(email.to_string())
  } else {
    Err(ValidationError(
      format!("email must look like name@domain.tld, got '{}'", email)
    ))
  }
}

// Ids end up in URLs we send by email, so only
// allow boring characters.
pub fn validate_comment_id(id: &str) -> Result<String, ValidationError> {
  if id.is_empty() {
    return Err(ValidationError("comment id cannot be empty".to_string()));
  }
  if id.len() > MAX_ID_LENGTH {
    return Err(ValidationError(
      format!("comment id cannot be longer than {} characters", MAX_ID_LENGTH)
    ));
  }
  if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
    return Err(ValidationError(
      "comment id contains invalid characters".to_string()
    ));
  }
  Ok(id.to_string())
}

pub fn decode_comment(value: &Value) -> Result<Comment, ValidationError> {
  decode_comment_at(value, "", 0)
}

// New comments always come without replies, the
// responses field has to be null or missing.
pub fn decode_add_comment(value: &Value) -> Result<AddComment, ValidationError> {
  let obj = as_object(value, "")?;
  let email = email_field(obj, "")?;
  let name = text_field(obj, "", "name")?;
  let comment = text_field(obj, "", "comment")?;
  let path = string_field(obj, "", "path")?;
  let approved = bool_field(obj, "", "approved")?;
  let created_at = timestamp_field(obj, "", "created_at")?;
  let updated_at = timestamp_field(obj, "", "updated_at")?;
  match obj.get("responses") {
    None | Some(Value::Null) => Ok(AddComment {
      path,
      email,
      name,
      comment,
      approved,
      created_at,
      updated_at
    }),
    Some(_) => Err(ValidationError(
      "responses must be null for a new comment".to_string()
    ))
  }
}

fn decode_comment_at(
  value: &Value,
  prefix: &str,
  depth: usize
) -> Result<Comment, ValidationError> {
  if depth > MAX_THREAD_DEPTH {
    return Err(ValidationError(format!(
      "{}: reply threads cannot be nested deeper than {} levels",
      field_name(prefix, "responses"),
      MAX_THREAD_DEPTH
    )));
  }
  let obj = as_object(value, prefix)?;
  let id = match obj.get("id") {
    Some(Value::String(id)) => validate_comment_id(id)
      .map_err(|e| ValidationError(format!("{}: {}", field_name(prefix, "id"), e)))?,
    _ => return Err(expected(prefix, "id", "a string"))
  };
  let email = email_field(obj, prefix)?;
  let name = text_field(obj, prefix, "name")?;
  let comment = text_field(obj, prefix, "comment")?;
  let path = string_field(obj, prefix, "path")?;
  let approved = bool_field(obj, prefix, "approved")?;
  let created_at = timestamp_field(obj, prefix, "created_at")?;
  let updated_at = timestamp_field(obj, prefix, "updated_at")?;
  let responses = match obj.get("responses") {
    Some(responses) => decode_responses_at(responses, prefix, depth + 1)?,
    None => return Err(expected(prefix, "responses", "null or a list of comments"))
  };
  Ok(Comment {
    id,
    path,
    email,
    name,
    comment,
    approved,
    created_at,
    updated_at,
    responses
  })
}

// Any broken reply fails the whole thing, we never
// keep half a thread.
fn decode_responses_at(
  value: &Value,
  prefix: &str,
  depth: usize
) -> Result<Option<Vec<Comment>>, ValidationError> {
  match value {
    Value::Null => Ok(None),
    Value::Array(items) => items.iter()
      .enumerate()
      .map(|(i, item)| decode_comment_at(
        item,
        &format!("{}responses[{}].", prefix, i),
        depth
      ))
      .collect::<Result<Vec<Comment>, ValidationError>>()
      .map(Some),
    _ => Err(expected(prefix, "responses", "null or a list of comments"))
  }
}

fn as_object<'a>(
  value: &'a Value,
  prefix: &str
) -> Result<&'a Map<String, Value>, ValidationError> {
  value.as_object().ok_or_else(|| {
    let what = if prefix.is_empty() { "comment" } else { prefix.trim_end_matches('.') };
    ValidationError(format!("{} must be a JSON object", what))
  })
}

fn field_name(prefix: &str, key: &str) -> String {
  format!("{}{}", prefix, key)
}

fn expected(prefix: &str, key: &str, what: &str) -> ValidationError {
  ValidationError(format!("{} must be {}", field_name(prefix, key), what))
}

fn string_field(
  obj: &Map<String, Value>,
  prefix: &str,
  key: &str
) -> Result<String, ValidationError> {
  match obj.get(key) {
    Some(Value::String(s)) => Ok(s.clone()),
    _ => Err(expected(prefix, key, "a string"))
  }
}

fn text_field(
  obj: &Map<String, Value>,
  prefix: &str,
  key: &str
) -> Result<String, ValidationError> {
  let text = string_field(obj, prefix, key)?;
  if text.chars().count() > MIN_TEXT_LENGTH {
    Ok(text)
  } else {
    Err(ValidationError(format!(
      "{} must be longer than {} characters",
      field_name(prefix, key),
      MIN_TEXT_LENGTH
    )))
  }
}

fn email_field(
  obj: &Map<String, Value>,
  prefix: &str
) -> Result<String, ValidationError> {
  let email = string_field(obj, prefix, "email")?;
  validate_email(&email)
    .map_err(|e| ValidationError(format!("{}{}", prefix, e)))
}

fn bool_field(
  obj: &Map<String, Value>,
  prefix: &str,
  key: &str
) -> Result<bool, ValidationError> {
  obj.get(key)
    .and_then(Value::as_bool)
    .ok_or_else(|| expected(prefix, key, "a boolean"))
}

// Browsers happily send floats for Date.now()
// based values, we just drop the decimals.
fn timestamp_field(
  obj: &Map<String, Value>,
  prefix: &str,
  key: &str
) -> Result<i64, ValidationError> {
  match obj.get(key) {
    Some(Value::Number(n)) => n.as_i64()
      .or_else(|| n.as_f64().map(|f| f as i64))
      .ok_or_else(|| expected(prefix, key, "a number")),
    _ => Err(expected(prefix, key, "a number"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn raw_comment(id: &str) -> Value {
    json!({
      "id": id,
      "path": "/some-article",
      "email": "x@y.com",
      "name": "Ann",
      "comment": "Nice post",
      "approved": true,
      "created_at": 1615150740000i64,
      "updated_at": 1615150740000i64,
      "responses": null
    })
  }

  #[test]
  fn accepts_simple_emails() {
    assert!(is_valid_email("x@y.com"));
    assert!(is_valid_email("first.last+tag@sub.domain.eu"));
  }

  #[test]
  fn rejects_malformed_emails() {
    for email in &["", "nobody", "x@y", "@y.com", "x@.com ", "x y@z.com", "x@@y.com"] {
      assert!(validate_email(email).is_err(), "accepted {}", email);
    }
  }

  #[test]
  fn comment_ids_are_restricted() {
    assert!(validate_comment_id("3f1c0a9b2d2e4b7c9a0d").is_ok());
    assert!(validate_comment_id("abc_DEF-123").is_ok());
    assert!(validate_comment_id("").is_err());
    assert!(validate_comment_id("../etc").is_err());
    assert!(validate_comment_id(&"a".repeat(MAX_ID_LENGTH + 1)).is_err());
  }

  #[test]
  fn decodes_valid_comment() {
    let comment = decode_comment(&raw_comment("abc")).unwrap();
    assert_eq!(comment.id, "abc");
    assert_eq!(comment.name, "Ann");
    assert!(comment.approved);
    assert_eq!(comment.responses, None);
  }

  #[test]
  fn first_invalid_field_wins() {
    let mut raw = raw_comment("abc");
    raw["email"] = json!("nope");
    raw["name"] = json!("A");
    let err = decode_comment(&raw).unwrap_err();
    assert!(err.0.contains("email"), "{}", err);
  }

  #[test]
  fn short_names_and_comments_are_rejected() {
    let mut raw = raw_comment("abc");
    raw["name"] = json!("Al");
    assert!(decode_comment(&raw).unwrap_err().0.contains("name"));
    let mut raw = raw_comment("abc");
    raw["comment"] = json!("ok");
    assert!(decode_comment(&raw).unwrap_err().0.contains("comment"));
  }

  #[test]
  fn length_counts_padding_and_characters() {
    for name in &["Al ", " Bo", "   ", "Zoë"] {
      let mut raw = raw_comment("abc");
      raw["name"] = json!(name);
      assert_eq!(decode_comment(&raw).unwrap().name, *name);
    }
    // Two characters, four bytes.
    let mut raw = raw_comment("abc");
    raw["comment"] = json!("éé");
    assert!(decode_comment(&raw).is_err());
  }

  #[test]
  fn wrong_types_are_rejected() {
    let mut raw = raw_comment("abc");
    raw["approved"] = json!("true");
    assert!(decode_comment(&raw).unwrap_err().0.contains("approved"));
    let mut raw = raw_comment("abc");
    raw["created_at"] = json!("yesterday");
    assert!(decode_comment(&raw).unwrap_err().0.contains("created_at"));
    let mut raw = raw_comment("abc");
    raw["path"] = json!(12);
    assert!(decode_comment(&raw).unwrap_err().0.contains("path"));
    assert!(decode_comment(&json!("hello")).is_err());
  }

  #[test]
  fn float_timestamps_are_truncated() {
    let mut raw = raw_comment("abc");
    raw["updated_at"] = json!(1615150740000.7f64);
    assert_eq!(decode_comment(&raw).unwrap().updated_at, 1615150740000);
  }

  #[test]
  fn one_bad_reply_fails_the_whole_thread() {
    let mut good = raw_comment("child1");
    let mut bad = raw_comment("child2");
    bad["email"] = json!("not an email");
    good["responses"] = json!([]);
    let mut raw = raw_comment("parent");
    raw["responses"] = json!([good, bad]);
    let err = decode_comment(&raw).unwrap_err();
    assert!(err.0.starts_with("responses[1]."), "{}", err);
  }

  #[test]
  fn two_level_thread_round_trips() {
    let mut grandchild = raw_comment("grandchild");
    grandchild["approved"] = json!(false);
    let mut child = raw_comment("child");
    child["responses"] = json!([grandchild]);
    let mut raw = raw_comment("parent");
    raw["responses"] = json!([child, raw_comment("sibling")]);

    let decoded = decode_comment(&raw).unwrap();
    let encoded = serde_json::to_value(&decoded).unwrap();
    assert_eq!(decode_comment(&encoded).unwrap(), decoded);
    let thread = decoded.responses.unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0].responses.as_ref().unwrap()[0].id, "grandchild");
  }

  #[test]
  fn threads_deeper_than_the_limit_are_rejected() {
    let mut raw = raw_comment("leaf");
    for level in 0..=MAX_THREAD_DEPTH {
      let mut parent = raw_comment(&format!("level{}", level));
      parent["responses"] = json!([raw]);
      raw = parent;
    }
    let err = decode_comment(&raw).unwrap_err();
    assert!(err.0.contains("nested deeper"), "{}", err);
  }

  #[test]
  fn add_comment_requires_null_responses() {
    let mut raw = raw_comment("ignored");
    raw["approved"] = json!(false);
    let add = decode_add_comment(&raw).unwrap();
    assert!(!add.approved);
    raw["responses"] = json!([]);
    assert!(decode_add_comment(&raw).is_err());
  }
}
