use crate::message::{ColumnInfo, MessageType, QuestionRow};
use anyhow::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read-only access to the interview messages table.
///
/// Each call is a single query attempted once; errors are returned to the
/// caller, which decides whether the run continues.
#[async_trait]
pub trait MessageStore: Send {
    /// Columns of the messages table in physical order. Empty when the table
    /// does not exist.
    async fn table_columns(&mut self) -> Result<Vec<ColumnInfo>, Error>;

    /// Questions inserted at or after `cutoff`, newest first, with
    /// `hours_ago` filled in.
    async fn questions_since(&mut self, cutoff: DateTime<Utc>) -> Result<Vec<QuestionRow>, Error>;

    /// The `limit` newest questions regardless of age.
    async fn latest_questions(&mut self, limit: u32) -> Result<Vec<QuestionRow>, Error>;

    async fn count_messages(&mut self, message_type: MessageType) -> Result<i64, Error>;

    /// Releases the connection.
    async fn close(self) -> Result<(), Error>
    where
        Self: Sized;
}
