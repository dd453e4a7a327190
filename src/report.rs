//! Human-readable rendering of the inspection results.
//!
//! Everything the operator reads goes through [`Report`], which writes to any
//! `io::Write` so that the output can be checked in tests.

use crate::config::DatabaseConfig;
use crate::message::{ColumnInfo, MESSAGES_TABLE, MessageCounts, Metadata, QuestionRow};
use std::fmt::Display;
use std::io::{self, Write};

pub struct Report<W: Write> {
    out: W,
}

impl<W: Write> Report<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn banner(&mut self) -> io::Result<()> {
        writeln!(self.out, "🔍 MockMate Database Question Checker")?;
        writeln!(self.out, "{}", "=".repeat(50))
    }

    pub fn step(&mut self, number: u32, title: &str) -> io::Result<()> {
        writeln!(self.out, "\n{}. {}...", number, title)
    }

    pub fn connecting(&mut self, config: &DatabaseConfig) -> io::Result<()> {
        writeln!(self.out, "🔗 Connecting to database: {}", config)
    }

    pub fn connected(&mut self) -> io::Result<()> {
        writeln!(self.out, "✅ Database connection successful!")
    }

    pub fn connection_failed(
        &mut self,
        config: &DatabaseConfig,
        cause: &impl Display,
    ) -> io::Result<()> {
        writeln!(self.out, "❌ Database connection failed: {}", cause)?;
        writeln!(self.out, "\n💡 Possible solutions:")?;
        writeln!(
            self.out,
            "  1. Check if PostgreSQL is running on {}:{}",
            config.host, config.port
        )?;
        writeln!(self.out, "  2. Verify database '{}' exists", config.dbname)?;
        writeln!(self.out, "  3. Verify user '{}' exists with correct password", config.user)?;
        writeln!(self.out, "  4. Check if user has access to the database")
    }

    pub fn failure(&mut self, what: &str, cause: &impl Display) -> io::Result<()> {
        writeln!(self.out, "❌ Error {}: {}", what, cause)
    }

    pub fn table_structure(&mut self, columns: &[ColumnInfo]) -> io::Result<()> {
        if columns.is_empty() {
            return writeln!(self.out, "❌ {} table not found", MESSAGES_TABLE);
        }
        writeln!(self.out, "📋 {} table structure:", MESSAGES_TABLE)?;
        writeln!(self.out, "{}", "-".repeat(60))?;
        for column in columns {
            let nullable = if column.nullable { "NULL" } else { "NOT NULL" };
            writeln!(
                self.out,
                "   {:20} | {:15} | {:8} | {}",
                column.name,
                column.data_type,
                nullable,
                column.default.as_deref().unwrap_or("")
            )?;
        }
        Ok(())
    }

    pub fn recent_questions(
        &mut self,
        questions: &[QuestionRow],
        window_hours: u32,
    ) -> io::Result<()> {
        if questions.is_empty() {
            return writeln!(self.out, "❌ No questions found in the last {} hours", window_hours);
        }
        writeln!(
            self.out,
            "✅ Found {} question(s) in the last {} hours:",
            questions.len(),
            window_hours
        )?;
        writeln!(self.out, "{}", "-".repeat(80))?;
        for (i, question) in questions.iter().enumerate() {
            self.question(i + 1, question, true)?;
        }
        Ok(())
    }

    pub fn latest_questions(&mut self, questions: &[QuestionRow]) -> io::Result<()> {
        if questions.is_empty() {
            return writeln!(self.out, "❌ No questions found in the database");
        }
        writeln!(self.out, "✅ Found {} most recent question(s):", questions.len())?;
        writeln!(self.out, "{}", "-".repeat(80))?;
        for (i, question) in questions.iter().enumerate() {
            self.question(i + 1, question, false)?;
        }
        Ok(())
    }

    fn question(&mut self, number: usize, question: &QuestionRow, preview: bool) -> io::Result<()> {
        writeln!(self.out, "\n📝 Question #{}:", number)?;
        writeln!(self.out, "   ID: {}", question.id)?;
        writeln!(self.out, "   Session: {}", question.session_id)?;
        if preview {
            writeln!(self.out, "   Text: {}", question.preview())?;
        } else {
            writeln!(self.out, "   Text: {}", question.content)?;
        }
        writeln!(
            self.out,
            "   Timestamp: {}",
            question.timestamp.format("%Y-%m-%d %H:%M:%S%.6f UTC")
        )?;
        if let Some(hours_ago) = question.hours_ago {
            writeln!(self.out, "   Time ago: {:.1} hours", hours_ago)?;
        }

        match question.parsed_metadata() {
            Some(Metadata::Parsed(meta)) => {
                writeln!(self.out, "   Source: {}", meta.source())?;
                writeln!(self.out, "   Category: {}", meta.category())?;
                writeln!(self.out, "   Difficulty: {}", meta.difficulty())?;
            }
            Some(Metadata::Raw(raw)) => {
                writeln!(self.out, "   Metadata: {}", raw)?;
            }
            None => {}
        }
        Ok(())
    }

    pub fn summary(&mut self, counts: &MessageCounts) -> io::Result<()> {
        writeln!(self.out, "\n📊 Database Summary:")?;
        writeln!(self.out, "   Total Questions: {}", counts.questions)?;
        writeln!(self.out, "   Total Answers: {}", counts.answers)
    }

    pub fn closed(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n🔒 Database connection closed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn render(f: impl FnOnce(&mut Report<Vec<u8>>) -> io::Result<()>) -> String {
        let mut report = Report::new(Vec::new());
        f(&mut report).expect("write to Vec cannot fail");
        String::from_utf8(report.into_inner()).expect("report is UTF-8")
    }

    fn question(content: &str, metadata: Option<&str>, hours_ago: Option<f64>) -> QuestionRow {
        QuestionRow {
            id: "7f0c1c6e-0000-4000-8000-000000000001".to_string(),
            session_id: "session-1".to_string(),
            content: content.to_string(),
            metadata: metadata.map(str::to_string),
            timestamp: Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap(),
            hours_ago,
        }
    }

    #[test]
    fn test_table_structure() {
        let columns = vec![
            ColumnInfo {
                name: "id".to_string(),
                data_type: "uuid".to_string(),
                nullable: false,
                default: Some("gen_random_uuid()".to_string()),
            },
            ColumnInfo {
                name: "metadata".to_string(),
                data_type: "jsonb".to_string(),
                nullable: true,
                default: None,
            },
        ];
        let out = render(|r| r.table_structure(&columns));
        assert!(out.contains("📋 interview_messages table structure:"));
        let id_line = format!(
            "   {:20} | {:15} | {:8} | gen_random_uuid()\n",
            "id", "uuid", "NOT NULL"
        );
        let metadata_line = format!("   {:20} | {:15} | {:8} | \n", "metadata", "jsonb", "NULL");
        assert!(out.contains(&id_line));
        assert!(out.contains(&metadata_line));
    }

    #[test]
    fn test_table_not_found() {
        let out = render(|r| r.table_structure(&[]));
        assert_eq!(out, "❌ interview_messages table not found\n");
    }

    #[test]
    fn test_recent_view_truncates() {
        let long = "a".repeat(150);
        let questions = vec![question(&long, None, Some(1.26))];
        let out = render(|r| r.recent_questions(&questions, 24));
        assert!(out.contains("✅ Found 1 question(s) in the last 24 hours:"));
        assert!(out.contains(&format!("   Text: {}...\n", "a".repeat(100))));
        assert!(out.contains("   Time ago: 1.3 hours\n"));
        assert!(out.contains("   Timestamp: 2026-10-14 09:30:00.000000 UTC"));
    }

    #[test]
    fn test_latest_view_shows_full_text() {
        let long = "b".repeat(150);
        let questions = vec![question(&long, None, None)];
        let out = render(|r| r.latest_questions(&questions));
        assert!(out.contains("✅ Found 1 most recent question(s):"));
        assert!(out.contains(&format!("   Text: {}\n", long)));
        assert!(!out.contains("Time ago"));
    }

    #[test]
    fn test_metadata_placeholders() {
        let questions = vec![question(
            "Explain quicksort",
            Some(r#"{"source":"llm","category":"algorithms"}"#),
            Some(2.0),
        )];
        let out = render(|r| r.recent_questions(&questions, 24));
        assert!(out.contains("   Source: llm\n"));
        assert!(out.contains("   Category: algorithms\n"));
        assert!(out.contains("   Difficulty: unknown\n"));
    }

    #[test]
    fn test_malformed_metadata_shown_raw() {
        let questions = vec![question("Explain quicksort", Some("{not json"), None)];
        let out = render(|r| r.latest_questions(&questions));
        assert!(out.contains("   Metadata: {not json\n"));
        assert!(!out.contains("Source:"));
    }

    #[test]
    fn test_missing_metadata_renders_nothing() {
        let questions = vec![question("Explain quicksort", None, None)];
        let out = render(|r| r.latest_questions(&questions));
        assert!(!out.contains("Source:"));
        assert!(!out.contains("Metadata:"));
    }

    #[test]
    fn test_empty_views() {
        assert_eq!(
            render(|r| r.recent_questions(&[], 24)),
            "❌ No questions found in the last 24 hours\n"
        );
        assert_eq!(
            render(|r| r.latest_questions(&[])),
            "❌ No questions found in the database\n"
        );
    }

    #[test]
    fn test_connection_failed_hides_password() {
        let config = DatabaseConfig {
            password: "secret".to_string(),
            ..DatabaseConfig::default()
        };
        let out = render(|r| r.connection_failed(&config, &"connection refused"));
        assert!(out.starts_with("❌ Database connection failed: connection refused\n"));
        assert!(out.contains("Verify database 'mockmate_db' exists"));
        assert!(!out.contains("secret"));
    }

    #[test]
    fn test_summary() {
        let counts = MessageCounts {
            questions: 12,
            answers: 9,
        };
        let out = render(|r| r.summary(&counts));
        assert_eq!(
            out,
            "\n📊 Database Summary:\n   Total Questions: 12\n   Total Answers: 9\n"
        );
    }
}
