pub mod ai_helper;
pub mod bank;
pub mod question;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

pub use bank::{DifficultyFilter, QuestionBank};
pub use question::{Difficulty, Question, QuestionKey, QuestionKind};

use crate::ledger::{ReviewList, ScoreRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Scoring {
    /// +10 for a right answer, -5 for a wrong one.
    #[default]
    Points,
    /// One point per right answer.
    Count,
}

impl Scoring {
    fn delta(&self, correct: bool) -> i64 {
        match (self, correct) {
            (Scoring::Points, true) => 10,
            (Scoring::Points, false) => -5,
            (Scoring::Count, true) => 1,
            (Scoring::Count, false) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnsweredQuestion {
    pub question: String,
    pub chosen: String,
    pub correct: String,
    pub explanation: String,
    #[serde(rename = "is_correct")]
    pub correct_flag: bool,
    pub timed_out: bool,
}

/// Result of answering the current question.
#[derive(Debug, Clone)]
pub struct Graded {
    pub correct: bool,
    pub timed_out: bool,
    pub question: Question,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Quiz {
    pub questions: Vec<Question>,
    pub current_question: usize,
    pub score: i64,
    pub correct_answers: usize,
    pub scoring: Scoring,
    /// Label stored with the final score, e.g. the difficulty or `review`.
    pub mode: String,
    /// Seconds allowed per question; `None` means no limit.
    pub time_limit: Option<u32>,
    pub asked_at: Option<DateTime<Utc>>,
    pub history: Vec<AnsweredQuestion>,
}

impl Quiz {
    pub fn new(questions: Vec<Question>, scoring: Scoring, mode: impl Into<String>) -> Self {
        Self {
            questions,
            current_question: 0,
            score: 0,
            correct_answers: 0,
            scoring,
            mode: mode.into(),
            time_limit: None,
            asked_at: None,
            history: Vec::new(),
        }
    }

    pub fn with_time_limit(mut self, seconds: u32) -> Self {
        self.time_limit = (seconds > 0).then_some(seconds);
        self
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.current_question)
    }

    pub fn is_finished(&self) -> bool {
        self.current_question >= self.questions.len()
    }

    /// Marks the current question as shown and returns its choices in the
    /// order to present them. Single-answer choices are shuffled; multiple
    /// choice keeps file order so that replies by number stay stable.
    pub fn ask<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> Option<Vec<String>> {
        let question = self.questions.get(self.current_question)?;
        let mut choices = question.choices().to_vec();
        if let QuestionKind::Mcq { .. } = question.kind {
            choices.shuffle(rng);
        }
        self.asked_at = Some(now);
        Some(choices)
    }

    fn past_deadline(&self, now: DateTime<Utc>) -> bool {
        match (self.time_limit, self.asked_at) {
            (Some(limit), Some(asked_at)) => now - asked_at > Duration::seconds(i64::from(limit)),
            _ => false,
        }
    }

    /// Grades `reply` against the current question and moves on to the next.
    pub fn answer(&mut self, reply: &str, now: DateTime<Utc>) -> Option<Graded> {
        let question = self.questions.get(self.current_question)?.clone();
        let timed_out = self.past_deadline(now);
        let correct = !timed_out && question.check(reply);

        self.score += self.scoring.delta(correct);
        if correct {
            self.correct_answers += 1;
        }
        self.history.push(AnsweredQuestion {
            question: question.text.clone(),
            chosen: reply.trim().to_string(),
            correct: question.correct_answer(),
            explanation: question.explanation.clone(),
            correct_flag: correct,
            timed_out,
        });
        self.current_question += 1;
        self.asked_at = None;

        Some(Graded {
            correct,
            timed_out,
            question,
        })
    }

    /// Like [`Quiz::answer`], then queues the question in `review` if the
    /// answer was wrong or late.
    pub fn answer_and_record(
        &mut self,
        reply: &str,
        now: DateTime<Utc>,
        review: &ReviewList,
    ) -> Option<Graded> {
        let graded = self.answer(reply, now)?;
        review.record_answer(&graded.question, graded.correct);
        Some(graded)
    }

    pub fn percentage(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        self.correct_answers as f64 / self.questions.len() as f64 * 100.0
    }

    pub fn performance(&self) -> Performance {
        Performance::from_percentage(self.percentage())
    }

    pub fn score_record(&self, time: DateTime<Utc>) -> ScoreRecord {
        ScoreRecord {
            score: self.score,
            total: self.questions.len(),
            mode: self.mode.clone(),
            time,
        }
    }

    /// One block per answered question, as shown after the quiz.
    pub fn review_text(&self) -> String {
        self.history
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let chosen = if item.timed_out {
                    "<timed out>"
                } else if item.chosen.is_empty() {
                    "<none>"
                } else {
                    item.chosen.as_str()
                };
                let mark = if item.correct_flag { "✅" } else { "❌" };
                let mut block = format!(
                    "{} Q{}: {}\nChosen: {}\nCorrect: {}",
                    mark,
                    i + 1,
                    item.question,
                    chosen,
                    item.correct
                );
                if !item.explanation.is_empty() {
                    block.push_str(&format!("\nExplanation: {}", item.explanation));
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Performance {
    Outstanding,
    Excellent,
    Good,
    NotBad,
    KeepLearning,
}

impl Performance {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Performance::Outstanding
        } else if percentage >= 80.0 {
            Performance::Excellent
        } else if percentage >= 70.0 {
            Performance::Good
        } else if percentage >= 60.0 {
            Performance::NotBad
        } else {
            Performance::KeepLearning
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Performance::Outstanding => "🌟 Outstanding! You've mastered these concepts!",
            Performance::Excellent => "🎯 Excellent work! You have strong knowledge!",
            Performance::Good => "👍 Good job! Keep studying to improve further!",
            Performance::NotBad => "📚 Not bad! Review the concepts and try again!",
            Performance::KeepLearning => "💪 Keep learning! Practice makes perfect!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::question::RawQuestion;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn q(json: serde_json::Value) -> Question {
        let raw: RawQuestion = serde_json::from_value(json).unwrap();
        Question::try_from(raw).unwrap()
    }

    fn three_questions() -> Vec<Question> {
        vec![
            q(serde_json::json!({"question": "Port for HTTPS?", "difficulty": "easy",
                "choices": ["80", "443", "22"], "answer": "443"})),
            q(serde_json::json!({"question": "Enter global config", "difficulty": "easy",
                "type": "cli", "accepted_answers": ["configure terminal", "re:^conf(igure)?\\s+t"]})),
            q(serde_json::json!({"question": "Acronym for SQL injection?", "difficulty": "easy",
                "type": "text", "answer": "SQLi", "explanation": "Structured Query Language injection"})),
        ]
    }

    #[test]
    fn points_scoring_adds_and_subtracts() {
        let now = Utc::now();
        let mut quiz = Quiz::new(three_questions(), Scoring::Points, "easy");
        assert!(quiz.answer("443", now).unwrap().correct);
        assert!(quiz.answer("conf t", now).unwrap().correct);
        assert!(!quiz.answer("xss", now).unwrap().correct);
        assert!(quiz.is_finished());
        assert!(quiz.answer("anything", now).is_none());

        assert_eq!(quiz.score, 15);
        assert_eq!(quiz.correct_answers, 2);
        assert_eq!(quiz.history.len(), 3);
        assert_eq!(quiz.history[2].correct, "SQLi");
        assert_eq!(quiz.performance(), Performance::NotBad);
    }

    #[test]
    fn count_scoring_never_goes_negative() {
        let now = Utc::now();
        let mut quiz = Quiz::new(three_questions(), Scoring::Count, "easy");
        for _ in 0..3 {
            quiz.answer("wrong", now);
        }
        assert_eq!(quiz.score, 0);
    }

    #[test]
    fn late_answers_count_as_wrong() {
        let mut rng = StdRng::seed_from_u64(1);
        let start = Utc::now();
        let mut quiz = Quiz::new(three_questions(), Scoring::Points, "easy").with_time_limit(30);

        quiz.ask(start, &mut rng);
        let graded = quiz.answer("443", start + Duration::seconds(31)).unwrap();
        assert!(graded.timed_out);
        assert!(!graded.correct);

        quiz.ask(start, &mut rng);
        let graded = quiz.answer("configure terminal", start + Duration::seconds(29)).unwrap();
        assert!(!graded.timed_out);
        assert!(graded.correct);
        assert_eq!(quiz.score, 5);
    }

    #[test]
    fn missed_and_late_answers_are_queued_for_review() {
        let dir = tempfile::tempdir().unwrap();
        let review = ReviewList::in_dir(dir.path());
        let mut rng = StdRng::seed_from_u64(5);
        let start = Utc::now();
        let questions = three_questions();
        let mut quiz = Quiz::new(questions.clone(), Scoring::Points, "easy").with_time_limit(30);

        quiz.ask(start, &mut rng);
        let graded = quiz
            .answer_and_record("443", start + Duration::seconds(45), &review)
            .unwrap();
        assert!(graded.timed_out);

        quiz.ask(start, &mut rng);
        quiz.answer_and_record("configure terminal", start + Duration::seconds(5), &review);

        quiz.ask(start, &mut rng);
        quiz.answer_and_record("XSS", start + Duration::seconds(5), &review);

        assert_eq!(review.load(), vec![questions[0].key(), questions[2].key()]);
        assert!(quiz
            .answer_and_record("too late", start, &review)
            .is_none());
    }

    #[test]
    fn ask_shuffles_only_single_choice() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut quiz = Quiz::new(three_questions(), Scoring::Points, "easy");
        let mut shown = quiz.ask(Utc::now(), &mut rng).unwrap();
        shown.sort();
        assert_eq!(shown, vec!["22", "443", "80"]);
        assert!(quiz.asked_at.is_some());

        quiz.answer("443", Utc::now());
        assert!(quiz.ask(Utc::now(), &mut rng).unwrap().is_empty());
    }

    #[test]
    fn score_record_and_review() {
        let now = Utc::now();
        let mut quiz = Quiz::new(three_questions(), Scoring::Points, "review");
        quiz.answer("443", now);
        quiz.answer("", now);
        quiz.answer("sqli", now);

        let record = quiz.score_record(now);
        assert_eq!(record.score, 15);
        assert_eq!(record.total, 3);
        assert_eq!(record.mode, "review");

        let text = quiz.review_text();
        assert!(text.contains("Q2: Enter global config\nChosen: <none>\nCorrect: configure terminal"));
        assert!(text.contains("Explanation: Structured Query Language injection"));
    }

    #[test]
    fn performance_thresholds() {
        assert_eq!(Performance::from_percentage(90.0), Performance::Outstanding);
        assert_eq!(Performance::from_percentage(85.0), Performance::Excellent);
        assert_eq!(Performance::from_percentage(70.0), Performance::Good);
        assert_eq!(Performance::from_percentage(60.0), Performance::NotBad);
        assert_eq!(Performance::from_percentage(59.9), Performance::KeepLearning);
    }
}
