use crate::config::DatabaseConfig;
use crate::message::{ColumnInfo, MESSAGES_TABLE, MessageType, QuestionRow};
use crate::store::MessageStore;
use anyhow::{Context, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info};

const COLUMNS_QUERY: &str = "
    SELECT column_name::text, data_type::text, is_nullable::text, column_default::text
    FROM information_schema.columns
    WHERE table_name = $1::text
    ORDER BY ordinal_position";

const QUESTIONS_SINCE_QUERY: &str = "
    SELECT
        id::text,
        session_id::text,
        content,
        metadata::text,
        timestamp::timestamptz,
        (EXTRACT(EPOCH FROM (NOW() - timestamp::timestamptz)) / 3600)::float8 AS hours_ago
    FROM interview_messages
    WHERE message_type::text = $1
    AND timestamp::timestamptz >= $2
    ORDER BY timestamp DESC";

const LATEST_QUESTIONS_QUERY: &str = "
    SELECT
        id::text,
        session_id::text,
        content,
        metadata::text,
        timestamp::timestamptz
    FROM interview_messages
    WHERE message_type::text = $1
    ORDER BY timestamp DESC
    LIMIT $2";

const COUNT_QUERY: &str = "SELECT COUNT(*) FROM interview_messages WHERE message_type::text = $1";

pub struct PostgresStore {
    client: Client,
    connection: JoinHandle<()>,
}

impl PostgresStore {
    /// Opens the single connection used for the whole run. The connection
    /// driver runs as a background task until the client is dropped.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pg = config.to_pg_config()?;
        let (client, connection) = pg
            .connect(NoTls)
            .await
            .with_context(|| format!("Failed to connect to {}", config))?;

        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Database connection error: {}", e);
            }
        });

        info!("PostgresStore connected to {}", config);
        Ok(Self { client, connection })
    }
}

#[async_trait]
impl MessageStore for PostgresStore {
    async fn table_columns(&mut self) -> Result<Vec<ColumnInfo>, Error> {
        let rows = self
            .client
            .query(COLUMNS_QUERY, &[&MESSAGES_TABLE])
            .await
            .context("Failed to query table structure")?;

        rows.iter()
            .map(|row| -> Result<ColumnInfo> {
                let nullable: String = row.try_get(2)?;
                Ok(ColumnInfo {
                    name: row.try_get(0)?,
                    data_type: row.try_get(1)?,
                    nullable: nullable == "YES",
                    default: row.try_get(3)?,
                })
            })
            .collect()
    }

    async fn questions_since(&mut self, cutoff: DateTime<Utc>) -> Result<Vec<QuestionRow>, Error> {
        debug!("Querying questions since {}", cutoff);
        let rows = self
            .client
            .query(
                QUESTIONS_SINCE_QUERY,
                &[&MessageType::Question.as_str(), &cutoff],
            )
            .await
            .context("Failed to query recent questions")?;

        rows.iter()
            .map(|row| -> Result<QuestionRow> {
                let mut question = question_from_row(row)?;
                question.hours_ago = Some(row.try_get(5)?);
                Ok(question)
            })
            .collect()
    }

    async fn latest_questions(&mut self, limit: u32) -> Result<Vec<QuestionRow>, Error> {
        debug!("Querying latest {} questions", limit);
        let rows = self
            .client
            .query(
                LATEST_QUESTIONS_QUERY,
                &[&MessageType::Question.as_str(), &i64::from(limit)],
            )
            .await
            .context("Failed to query latest questions")?;

        rows.iter().map(question_from_row).collect()
    }

    async fn count_messages(&mut self, message_type: MessageType) -> Result<i64, Error> {
        let row = self
            .client
            .query_one(COUNT_QUERY, &[&message_type.as_str()])
            .await
            .with_context(|| format!("Failed to count {} messages", message_type.as_str()))?;
        Ok(row.try_get(0)?)
    }

    async fn close(self) -> Result<(), Error> {
        drop(self.client);
        self.connection
            .await
            .context("Database connection task failed")?;
        info!("PostgresStore connection closed");
        Ok(())
    }
}

fn question_from_row(row: &Row) -> Result<QuestionRow> {
    let content: Option<String> = row.try_get(2)?;
    Ok(QuestionRow {
        id: row.try_get(0)?,
        session_id: row.try_get(1)?,
        content: content.unwrap_or_default(),
        metadata: row.try_get(3)?,
        timestamp: row.try_get(4)?,
        hours_ago: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Args, Config};
    use chrono::Duration;
    use clap::Parser;

    #[test]
    fn test_queries_filter_and_order() {
        for query in [QUESTIONS_SINCE_QUERY, LATEST_QUESTIONS_QUERY, COUNT_QUERY] {
            assert!(query.contains("WHERE message_type::text = $1"), "{}", query);
        }

        // Cutoff is inclusive.
        assert!(QUESTIONS_SINCE_QUERY.contains("timestamp::timestamptz >= $2"));
        assert!(QUESTIONS_SINCE_QUERY.contains("ORDER BY timestamp DESC"));
        assert!(!QUESTIONS_SINCE_QUERY.contains("LIMIT"));

        assert!(LATEST_QUESTIONS_QUERY.contains("ORDER BY timestamp DESC"));
        assert!(LATEST_QUESTIONS_QUERY.trim_end().ends_with("LIMIT $2"));

        assert!(COLUMNS_QUERY.contains("ORDER BY ordinal_position"));
    }

    // This test requires a running PostgreSQL reachable through the DB_*
    // environment variables, with an interview_messages table.
    #[tokio::test]
    #[ignore]
    async fn test_live_database() {
        let args = Args::try_parse_from(["question-inspector"]).expect("Failed to read env");
        let config = Config::from(args);
        let mut store = PostgresStore::connect(&config.database)
            .await
            .expect("Failed to connect");

        let columns = store.table_columns().await.expect("Failed to read columns");
        assert!(columns.iter().any(|c| c.name == "message_type"));

        let cutoff = Utc::now() - Duration::hours(24);
        let recent = store
            .questions_since(cutoff)
            .await
            .expect("Failed to query recent questions");
        assert!(recent.iter().all(|q| q.timestamp >= cutoff));
        assert!(recent.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));

        let latest = store
            .latest_questions(3)
            .await
            .expect("Failed to query latest questions");
        assert!(latest.len() <= 3);
        assert!(latest.iter().all(|q| q.hours_ago.is_none()));

        let questions = store
            .count_messages(MessageType::Question)
            .await
            .expect("Failed to count questions");
        assert!(questions >= latest.len() as i64);

        store.close().await.expect("Failed to close");
    }
}
