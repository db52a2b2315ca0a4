use rusqlite::{params, Connection, OptionalExtension};
use derive_more::Display;
use async_trait::async_trait;
use log::{debug, error};
use uuid::Uuid;
pub mod entities;
mod mappers;
mod queries;
use entities::*;
use mappers::map_comment;
use crate::utils::time_utils::current_timestamp_millis;

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>;

#[derive(Debug, Display)]
pub enum StoreError {
  #[display(fmt = "No comment found for {}", _0)]
  NotFound(String),
  #[display(fmt = "Comment store failure: {}", _0)]
  Backend(String)
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
  fn from(error: rusqlite::Error) -> Self {
    error!("SQLite error in comment store - {}", error);
    StoreError::Backend(error.to_string())
  }
}

impl From<r2d2::Error> for StoreError {
  fn from(error: r2d2::Error) -> Self {
    error!("Could not get a connection from the pool - {}", error);
    StoreError::Backend(error.to_string())
  }
}

impl From<tokio::task::JoinError> for StoreError {
  fn from(error: tokio::task::JoinError) -> Self {
    error!("Comment store task died - {}", error);
    StoreError::Backend(error.to_string())
  }
}

/**
 * Everything the pipelines are allowed to do with
 * persisted comments. Nothing in here throws, every
 * call gives back a Result.
 */
#[async_trait]
pub trait CommentStore: Send + Sync {
  // The store picks the id.
  async fn create(&self, comment: AddComment) -> Result<StoredReference, StoreError>;

  async fn get(&self, id: &str) -> Result<Comment, StoreError>;

  async fn exists(&self, id: &str) -> Result<bool, StoreError> {
    match self.get(id).await {
      Ok(_) => Ok(true),
      Err(StoreError::NotFound(_)) => Ok(false),
      Err(e) => Err(e)
    }
  }

  // Approving an approved comment is fine and
  // changes nothing.
  async fn approve(&self, id: &str) -> Result<(), StoreError>;

  // Hard delete, NotFound when there was nothing
  // to delete.
  async fn delete(&self, id: &str) -> Result<(), StoreError>;

  async fn list_approved(&self) -> Result<Vec<Comment>, StoreError>;

  // An empty list is not an error here.
  async fn list_by_email(&self, email: &str) -> Result<Vec<Comment>, StoreError>;
}

pub struct SqliteCommentStore {
  pool: Pool
}

impl SqliteCommentStore {

  // Creates the table if it's not there yet.
  pub fn open(pool: Pool) -> Result<Self, StoreError> {
    let conn = pool.get()?;
    conn.execute_batch(queries::CREATE_COMMENTS_TABLE)?;
    Ok(Self { pool })
  }

  // rusqlite is blocking, so every query runs on
  // the blocking thread pool with its own pooled
  // connection.
  async fn run<T, F>(&self, query: F) -> Result<T, StoreError>
    where
      T: Send + 'static,
      F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static
  {
    let pool = self.pool.clone();
    tokio::task::spawn_blocking(move || {
      let conn = pool.get()?;
      query(&conn)
    }).await?
  }

}

#[async_trait]
impl CommentStore for SqliteCommentStore {

  async fn create(&self, comment: AddComment) -> Result<StoredReference, StoreError> {
    let id = Uuid::new_v4().simple().to_string();
    self.run(move |conn| {
      conn.execute(
        queries::INSERT_COMMENT,
        params![
          id,
          comment.path,
          comment.email,
          comment.name,
          comment.comment,
          comment.approved,
          comment.created_at,
          comment.updated_at
        ]
      )?;
      debug!("Inserted comment {}", id);
      Ok(StoredReference { id })
    }).await
  }

  async fn get(&self, id: &str) -> Result<Comment, StoreError> {
    let id = id.to_string();
    self.run(move |conn| {
      let comment = conn.query_row(&queries::select_by_id(), params![id], map_comment)
        .optional()?;
      comment.ok_or(StoreError::NotFound(id))
    }).await
  }

  async fn approve(&self, id: &str) -> Result<(), StoreError> {
    let id = id.to_string();
    self.run(move |conn| {
      let changed = conn.execute(
        queries::APPROVE_COMMENT,
        params![current_timestamp_millis(), id]
      )?;
      if changed > 0 {
        return Ok(());
      }
      // Nothing changed, either it was already
      // approved or it doesn't exist.
      let count: i64 = conn.query_row(
        queries::COUNT_BY_ID,
        params![id],
        |row| row.get(0)
      )?;
      if count > 0 { Ok(()) } else { Err(StoreError::NotFound(id)) }
    }).await
  }

  async fn delete(&self, id: &str) -> Result<(), StoreError> {
    let id = id.to_string();
    self.run(move |conn| {
      let deleted = conn.execute(queries::DELETE_COMMENT, params![id])?;
      if deleted > 0 { Ok(()) } else { Err(StoreError::NotFound(id)) }
    }).await
  }

  async fn list_approved(&self) -> Result<Vec<Comment>, StoreError> {
    self.run(|conn| {
      let mut stmt = conn.prepare(&queries::select_approved())?;
      let comments = stmt.query_map([], map_comment)?
        .collect::<Result<Vec<Comment>, rusqlite::Error>>()?;
      Ok(comments)
    }).await
  }

  async fn list_by_email(&self, email: &str) -> Result<Vec<Comment>, StoreError> {
    let email = email.to_string();
    self.run(move |conn| {
      let mut stmt = conn.prepare(&queries::select_by_email())?;
      let comments = stmt.query_map(params![email], map_comment)?
        .collect::<Result<Vec<Comment>, rusqlite::Error>>()?;
      Ok(comments)
    }).await
  }

}

// Only one connection, otherwise every connection
// gets its own empty in-memory database.
#[cfg(test)]
pub fn open_in_memory() -> SqliteCommentStore {
  let manager = r2d2_sqlite::SqliteConnectionManager::memory();
  let pool = Pool::builder()
    .max_size(1)
    .build(manager)
    .expect("In-memory SQLite pool");
  SqliteCommentStore::open(pool).expect("Comments table creation")
}

#[cfg(test)]
pub fn raw_execute(store: &SqliteCommentStore, sql: &str) {
  store.pool.get().unwrap().execute_batch(sql).unwrap();
}
