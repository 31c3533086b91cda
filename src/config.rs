use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::ledger::{ReviewList, ScoreHistory, DEFAULT_RETENTION};
use crate::quiz::ai_helper::Personality;
use crate::quiz::Scoring;

/// Everything the bot needs to know at startup, read once from the
/// environment (after `.env` has been loaded) and passed around explicitly.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub question_files: Vec<PathBuf>,
    pub labs_file: PathBuf,
    pub scenarios_file: PathBuf,
    pub study_file: PathBuf,
    pub state_dir: PathBuf,
    pub dialogue_db: PathBuf,
    pub score_retention: usize,
    pub quiz_length: usize,
    /// Seconds per question, 0 disables the limit.
    pub time_limit: u32,
    pub scoring: Scoring,
    pub personality: Personality,
    pub chatgpt_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Self {
            question_files: vec![data_dir.join("questions.json")],
            labs_file: data_dir.join("labs.json"),
            scenarios_file: data_dir.join("scenarios.json"),
            study_file: data_dir.join("study_content.md"),
            data_dir,
            state_dir: PathBuf::from("state"),
            dialogue_db: PathBuf::from("db.sqlite"),
            score_retention: DEFAULT_RETENTION,
            quiz_length: 20,
            time_limit: 0,
            scoring: Scoring::Points,
            personality: Personality::Instructor,
            chatgpt_api_key: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        let data_dir = get("LABTUTOR_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| settings.data_dir.clone());
        let in_data = |name: &str| data_dir.join(name);

        settings.question_files = match get("LABTUTOR_QUESTIONS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(in_data)
                .collect(),
            None => vec![in_data("questions.json")],
        };
        settings.labs_file = in_data(get("LABTUTOR_LABS").as_deref().unwrap_or("labs.json"));
        settings.scenarios_file =
            in_data(get("LABTUTOR_SCENARIOS").as_deref().unwrap_or("scenarios.json"));
        settings.study_file = in_data(get("LABTUTOR_STUDY").as_deref().unwrap_or("study_content.md"));
        settings.data_dir = data_dir.clone();

        if let Some(dir) = get("LABTUTOR_STATE_DIR") {
            settings.state_dir = PathBuf::from(dir);
        }
        if let Some(db) = get("LABTUTOR_DIALOGUE_DB") {
            settings.dialogue_db = PathBuf::from(db);
        }
        if let Some(value) = get("LABTUTOR_SCORE_RETENTION") {
            settings.score_retention = parse_number("LABTUTOR_SCORE_RETENTION", &value)?;
        }
        if let Some(value) = get("LABTUTOR_QUIZ_LENGTH") {
            settings.quiz_length = parse_number("LABTUTOR_QUIZ_LENGTH", &value)?;
        }
        if let Some(value) = get("LABTUTOR_TIME_LIMIT") {
            settings.time_limit = parse_number("LABTUTOR_TIME_LIMIT", &value)?;
        }
        if let Some(value) = get("LABTUTOR_SCORING") {
            settings.scoring = match value.trim().to_lowercase().as_str() {
                "points" => Scoring::Points,
                "count" => Scoring::Count,
                _ => {
                    return Err(ConfigError::Unsupported {
                        var: "LABTUTOR_SCORING",
                        value,
                        expected: "points, count",
                    })
                }
            };
        }
        if let Some(value) = get("LABTUTOR_PERSONALITY") {
            settings.personality =
                Personality::from_name(&value).ok_or(ConfigError::Unsupported {
                    var: "LABTUTOR_PERSONALITY",
                    value,
                    expected: "engineer, instructor, hacker",
                })?;
        }
        settings.chatgpt_api_key = get("CHATGPT_API_KEY");

        Ok(settings)
    }

    /// Ledger directory of one learner.
    pub fn learner_dir(&self, learner: impl std::fmt::Display) -> PathBuf {
        self.state_dir.join(learner.to_string())
    }

    pub fn review_list(&self, learner_dir: &Path) -> ReviewList {
        ReviewList::in_dir(learner_dir)
    }

    pub fn score_history(&self, learner_dir: &Path) -> ScoreHistory {
        ScoreHistory::in_dir(learner_dir, self.score_retention)
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::NotANumber {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.question_files, vec![PathBuf::from("data/questions.json")]);
        assert_eq!(s.labs_file, PathBuf::from("data/labs.json"));
        assert_eq!(s.score_retention, 20);
        assert_eq!(s.scoring, Scoring::Points);
        assert!(s.chatgpt_api_key.is_none());
    }

    #[test]
    fn content_paths_follow_data_dir() {
        let s = settings(&[
            ("LABTUTOR_DATA_DIR", "/srv/tutor"),
            ("LABTUTOR_QUESTIONS", "routing.json, legacy/routing.json"),
            ("LABTUTOR_SCORE_RETENTION", "50"),
            ("LABTUTOR_SCORING", "Count"),
        ])
        .unwrap();
        assert_eq!(
            s.question_files,
            vec![
                PathBuf::from("/srv/tutor/routing.json"),
                PathBuf::from("/srv/tutor/legacy/routing.json")
            ]
        );
        assert_eq!(s.study_file, PathBuf::from("/srv/tutor/study_content.md"));
        assert_eq!(s.score_retention, 50);
        assert_eq!(s.scoring, Scoring::Count);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            settings(&[("LABTUTOR_TIME_LIMIT", "soon")]),
            Err(ConfigError::NotANumber { var: "LABTUTOR_TIME_LIMIT", .. })
        ));
        assert!(matches!(
            settings(&[("LABTUTOR_PERSONALITY", "pirate")]),
            Err(ConfigError::Unsupported { .. })
        ));
    }

    #[test]
    fn ledger_lives_per_learner() {
        let s = settings(&[("LABTUTOR_STATE_DIR", "/tmp/state")]).unwrap();
        let dir = s.learner_dir(42);
        assert_eq!(dir, PathBuf::from("/tmp/state/42"));
    }
}
