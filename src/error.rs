use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Question #{index} in {path} is invalid: {source}")]
    InvalidQuestion {
        path: PathBuf,
        index: usize,
        #[source]
        source: QuestionError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("unknown difficulty `{0}`")]
    UnknownDifficulty(String),
    #[error("unknown question type `{0}`")]
    UnknownType(String),
    #[error("`answer` of a {kind} question must be {expected}")]
    AnswerShape {
        kind: &'static str,
        expected: &'static str,
    },
    #[error("`{0}` must not be empty")]
    Empty(&'static str),
    #[error("answer `{0}` is not one of the choices")]
    AnswerNotInChoices(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got `{value}`")]
    NotANumber { var: &'static str, value: String },
    #[error("{var} has unsupported value `{value}` (expected one of: {expected})")]
    Unsupported {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}
