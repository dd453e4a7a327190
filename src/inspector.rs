use crate::config::{Config, DatabaseConfig, InspectConfig};
use crate::message::{MessageCounts, MessageType};
use crate::report::Report;
use crate::store::MessageStore;
use anyhow::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::future::Future;
use std::io::Write;
use tracing::{error, info, warn};

/// What a completed run observed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub columns: usize,
    pub recent_questions: usize,
    /// `None` when the fallback listing was not needed.
    pub fallback_questions: Option<usize>,
    pub counts: MessageCounts,
}

/// Runs the whole inspection against the store produced by `connect`.
///
/// Returns `Ok(None)` when no connection could be made; nothing is queried in
/// that case. Once connected, the store is closed exactly once whatever the
/// outcome of the steps. Only a failure of the message counts is returned as
/// an error, every other query failure is reported and the run moves on.
pub async fn run<S, F, W>(
    connect: F,
    config: &Config,
    report: &mut Report<W>,
) -> Result<Option<RunSummary>>
where
    S: MessageStore,
    F: Future<Output = Result<S>>,
    W: Write,
{
    report.banner()?;

    let Some(mut store) = acquire(connect, &config.database, report).await? else {
        return Ok(None);
    };

    let result = inspect(&mut store, &config.inspect, report).await;

    match store.close().await {
        Ok(()) => report.closed()?,
        Err(e) => {
            warn!("Failed to close database connection: {:?}", e);
            report.failure("closing database connection", &e)?;
        }
    }

    result.map(Some)
}

async fn acquire<S, F, W>(
    connect: F,
    database: &DatabaseConfig,
    report: &mut Report<W>,
) -> Result<Option<S>>
where
    F: Future<Output = Result<S>>,
    W: Write,
{
    report.connecting(database)?;
    match connect.await {
        Ok(store) => {
            report.connected()?;
            Ok(Some(store))
        }
        Err(e) => {
            error!("Database connection failed: {:?}", e);
            report.connection_failed(database, &format!("{:#}", e))?;
            Ok(None)
        }
    }
}

async fn inspect<S, W>(
    store: &mut S,
    settings: &InspectConfig,
    report: &mut Report<W>,
) -> Result<RunSummary, Error>
where
    S: MessageStore,
    W: Write,
{
    report.step(1, "Checking table structure")?;
    let columns = match store.table_columns().await {
        Ok(columns) => {
            report.table_structure(&columns)?;
            columns.len()
        }
        Err(e) => {
            error!("Table structure check failed: {:?}", e);
            report.failure("checking table structure", &format!("{:#}", e))?;
            0
        }
    };

    let window = settings.window_hours;
    report.step(2, &format!("Checking recent questions (last {} hours)", window))?;
    let since = cutoff(Utc::now(), window);
    let recent = match store.questions_since(since).await {
        Ok(questions) => {
            report.recent_questions(&questions, window)?;
            questions
        }
        Err(e) => {
            error!("Recent questions query failed: {:?}", e);
            report.failure("querying questions", &format!("{:#}", e))?;
            Vec::new()
        }
    };

    let fallback_questions = if recent.is_empty() {
        let limit = settings.fallback_limit;
        report.step(3, &format!("Checking all questions (last {})", limit))?;
        let latest = match store.latest_questions(limit).await {
            Ok(questions) => {
                report.latest_questions(&questions)?;
                questions
            }
            Err(e) => {
                error!("Latest questions query failed: {:?}", e);
                report.failure("querying questions", &format!("{:#}", e))?;
                Vec::new()
            }
        };
        Some(latest.len())
    } else {
        None
    };

    let counts = MessageCounts {
        questions: store.count_messages(MessageType::Question).await?,
        answers: store.count_messages(MessageType::Answer).await?,
    };
    report.summary(&counts)?;

    let summary = RunSummary {
        columns,
        recent_questions: recent.len(),
        fallback_questions,
        counts,
    };
    info!("Inspection finished: {:?}", summary);
    Ok(summary)
}

/// Start of the recency window ending at `now`.
pub fn cutoff(now: DateTime<Utc>, window_hours: u32) -> DateTime<Utc> {
    TimeDelta::try_hours(i64::from(window_hours))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
