//! Per-learner review list and score history.
//!
//! Both are best effort: unreadable files load as empty and write failures
//! are only logged. Nothing here ever returns an error.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::quiz::{Question, QuestionBank, QuestionKey};
use crate::store;

pub const REVIEW_FILE: &str = "review_list.json";
pub const SCORES_FILE: &str = "scores.json";
pub const DEFAULT_RETENTION: usize = 20;

pub type ReviewEntry = QuestionKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: i64,
    pub total: usize,
    pub mode: String,
    pub time: DateTime<Utc>,
}

/// Questions answered wrongly, queued for another attempt.
#[derive(Debug, Clone)]
pub struct ReviewList {
    path: PathBuf,
}

impl ReviewList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(REVIEW_FILE))
    }

    pub fn load(&self) -> Vec<ReviewEntry> {
        store::read_json_or_default(&self.path)
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }

    /// Adds the question's key unless it is already queued. Returns the
    /// size of the list afterwards.
    pub fn add(&self, question: &Question) -> usize {
        let mut entries = self.load();
        let key = question.key();
        if !entries.contains(&key) {
            debug!("Queueing for review: {:?}", key.question);
            entries.push(key);
            store::write_json(&self.path, &entries);
        }
        entries.len()
    }

    pub fn record_answer(&self, question: &Question, was_correct: bool) {
        if !was_correct {
            self.add(question);
        }
    }

    /// The queued questions that still exist in `bank`, in queue order.
    pub fn resolve(&self, bank: &QuestionBank) -> Vec<Question> {
        self.load()
            .iter()
            .filter_map(|key| bank.find(key).cloned())
            .collect()
    }

    pub fn clear(&self) {
        store::remove(&self.path);
    }
}

/// Finished quizzes, most recent first, capped at `retention` entries.
#[derive(Debug, Clone)]
pub struct ScoreHistory {
    path: PathBuf,
    retention: usize,
}

impl ScoreHistory {
    pub fn new(path: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            path: path.into(),
            retention,
        }
    }

    pub fn in_dir(dir: &Path, retention: usize) -> Self {
        Self::new(dir.join(SCORES_FILE), retention)
    }

    pub fn load(&self) -> Vec<ScoreRecord> {
        store::read_json_or_default(&self.path)
    }

    pub fn record(&self, entry: ScoreRecord) {
        let mut scores = self.load();
        scores.insert(0, entry);
        scores.truncate(self.retention);
        store::write_json(&self.path, &scores);
    }

    pub fn clear(&self) {
        store::remove(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::question::RawQuestion;
    use chrono::Duration;

    fn question(difficulty: &str, text: &str) -> Question {
        let raw: RawQuestion = serde_json::from_value(serde_json::json!({
            "question": text,
            "difficulty": difficulty,
            "type": "text",
            "answer": "a",
        }))
        .unwrap();
        Question::try_from(raw).unwrap()
    }

    #[test]
    fn review_insertion_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let review = ReviewList::in_dir(dir.path());
        let q = question("easy", "What does ARP resolve?");

        assert_eq!(review.add(&q), 1);
        assert_eq!(review.add(&q), 1);
        assert_eq!(review.load(), vec![q.key()]);
    }

    #[test]
    fn only_wrong_answers_are_queued() {
        let dir = tempfile::tempdir().unwrap();
        let review = ReviewList::in_dir(dir.path());
        review.record_answer(&question("easy", "a"), true);
        assert!(review.is_empty());
        review.record_answer(&question("easy", "b"), false);
        review.record_answer(&question("hard", "b"), false);
        assert_eq!(review.len(), 2);
    }

    #[test]
    fn resolve_skips_unknown_questions() {
        let dir = tempfile::tempdir().unwrap();
        let review = ReviewList::in_dir(dir.path());
        let kept = question("medium", "What is NAT?");
        review.add(&question("medium", "Removed from the bank"));
        review.add(&kept);

        let bank = QuestionBank::new(vec![kept.clone(), question("easy", "other")]);
        assert_eq!(review.resolve(&bank), vec![kept]);
    }

    #[test]
    fn score_history_keeps_most_recent_within_cap() {
        let dir = tempfile::tempdir().unwrap();
        let history = ScoreHistory::in_dir(dir.path(), 20);
        let start = Utc::now();
        for i in 0..25 {
            history.record(ScoreRecord {
                score: i,
                total: 10,
                mode: "easy".into(),
                time: start + Duration::seconds(i),
            });
        }

        let scores = history.load();
        assert_eq!(scores.len(), 20);
        assert_eq!(scores[0].score, 24);
        assert_eq!(scores[19].score, 5);
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let review = ReviewList::in_dir(dir.path());
        let history = ScoreHistory::in_dir(dir.path(), 50);
        review.add(&question("easy", "q"));
        history.record(ScoreRecord {
            score: 1,
            total: 1,
            mode: "all".into(),
            time: Utc::now(),
        });

        review.clear();
        history.clear();
        assert!(!dir.path().join(REVIEW_FILE).exists());
        assert!(review.load().is_empty());
        assert!(history.load().is_empty());

        // Clearing twice is harmless.
        review.clear();
    }

    #[test]
    fn corrupt_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SCORES_FILE), "{ not json").unwrap();
        let history = ScoreHistory::in_dir(dir.path(), 20);
        assert!(history.load().is_empty());

        history.record(ScoreRecord {
            score: 3,
            total: 5,
            mode: "hard".into(),
            time: Utc::now(),
        });
        assert_eq!(history.load().len(), 1);
    }

    #[test]
    fn writes_into_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let review = ReviewList::in_dir(&dir.path().join("chat-42"));
        review.add(&question("easy", "q"));
        assert_eq!(review.len(), 1);
    }
}
