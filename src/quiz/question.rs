use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuestionError;
use crate::lab::pattern::{self, Pattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(QuestionError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// Identity of a question for dedup and the review list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionKey {
    pub difficulty: Difficulty,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    Mcq {
        choices: Vec<String>,
        answer: String,
    },
    Multiple {
        choices: Vec<String>,
        answer: Vec<String>,
    },
    Text {
        answer: String,
    },
    Cli {
        accepted_answers: Vec<Pattern>,
        answer: Option<String>,
    },
}

impl QuestionKind {
    pub fn name(&self) -> &'static str {
        match self {
            QuestionKind::Mcq { .. } => "mcq",
            QuestionKind::Multiple { .. } => "multiple",
            QuestionKind::Text { .. } => "text",
            QuestionKind::Cli { .. } => "cli",
        }
    }
}

/// A validated question. Stored and loaded in the same JSON shape the
/// question files use, so it can also travel inside dialogue state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion", into = "RawQuestion")]
pub struct Question {
    pub text: String,
    pub difficulty: Difficulty,
    pub kind: QuestionKind,
    pub explanation: String,
}

impl Question {
    pub fn key(&self) -> QuestionKey {
        QuestionKey {
            difficulty: self.difficulty,
            question: self.text.clone(),
        }
    }

    pub fn choices(&self) -> &[String] {
        match &self.kind {
            QuestionKind::Mcq { choices, .. } | QuestionKind::Multiple { choices, .. } => choices,
            _ => &[],
        }
    }

    /// The answer in the form shown to the learner after a miss.
    pub fn correct_answer(&self) -> String {
        match &self.kind {
            QuestionKind::Mcq { answer, .. } | QuestionKind::Text { answer } => answer.clone(),
            QuestionKind::Multiple { answer, .. } => answer.join(", "),
            QuestionKind::Cli {
                accepted_answers,
                answer,
            } => answer
                .clone()
                .or_else(|| accepted_answers.first().map(|p| p.raw().to_string()))
                .unwrap_or_default(),
        }
    }

    /// Judges a free-text reply. For `multiple` questions the reply is a
    /// comma-separated selection (see [`parse_selection`]).
    pub fn check(&self, reply: &str) -> bool {
        match &self.kind {
            QuestionKind::Mcq { answer, .. } => reply.trim() == answer.trim(),
            QuestionKind::Multiple { choices, answer } => {
                let selected = parse_selection(choices, reply);
                fold_set(selected.iter().map(String::as_str)) == fold_set(answer.iter().map(String::as_str))
            }
            QuestionKind::Text { answer } => reply.trim().to_lowercase() == answer.trim().to_lowercase(),
            QuestionKind::Cli {
                accepted_answers, ..
            } => pattern::matches_any(accepted_answers, reply),
        }
    }
}

fn fold_set<'a>(items: impl Iterator<Item = &'a str>) -> std::collections::BTreeSet<String> {
    items.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()).collect()
}

/// Turns `"1, 3"` or `"OSPF, EIGRP"` (or a mix) into choice texts.
/// A token equal to a choice (ignoring case) is that choice, so numeric
/// choices such as prefix lengths are picked by their text. Other numeric
/// tokens are 1-based indexes into `choices`; the rest are taken verbatim.
pub fn parse_selection(choices: &[String], reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            if let Some(choice) = choices
                .iter()
                .find(|c| c.trim().to_lowercase() == token.to_lowercase())
            {
                return choice.clone();
            }
            match token.parse::<usize>() {
                Ok(n) if n >= 1 && n <= choices.len() => choices[n - 1].clone(),
                _ => token.to_string(),
            }
        })
        .collect()
}

/// `answer` is a string for most types and a list for `multiple`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    One(String),
    Many(Vec<String>),
}

/// The loosely-typed JSON form of a question, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<RawAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_answers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl TryFrom<RawQuestion> for Question {
    type Error = QuestionError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let text = raw.question.ok_or(QuestionError::MissingField("question"))?;
        if text.trim().is_empty() {
            return Err(QuestionError::Empty("question"));
        }
        let difficulty: Difficulty = raw
            .difficulty
            .ok_or(QuestionError::MissingField("difficulty"))?
            .parse()?;
        let kind_name = raw.kind.unwrap_or_else(|| "mcq".to_string());

        let kind = match kind_name.as_str() {
            "mcq" => {
                let choices = raw.choices.ok_or(QuestionError::MissingField("choices"))?;
                let answer = match raw.answer.ok_or(QuestionError::MissingField("answer"))? {
                    RawAnswer::One(answer) => answer,
                    RawAnswer::Many(_) => {
                        return Err(QuestionError::AnswerShape {
                            kind: "mcq",
                            expected: "a string",
                        })
                    }
                };
                if !choices.iter().any(|c| c.trim() == answer.trim()) {
                    return Err(QuestionError::AnswerNotInChoices(answer));
                }
                QuestionKind::Mcq { choices, answer }
            }
            "multiple" => {
                let choices = raw.choices.ok_or(QuestionError::MissingField("choices"))?;
                let answer = match raw.answer.ok_or(QuestionError::MissingField("answer"))? {
                    RawAnswer::Many(answer) => answer,
                    RawAnswer::One(_) => {
                        return Err(QuestionError::AnswerShape {
                            kind: "multiple",
                            expected: "a list",
                        })
                    }
                };
                if answer.is_empty() {
                    return Err(QuestionError::Empty("answer"));
                }
                let folded = fold_set(choices.iter().map(String::as_str));
                if let Some(missing) = answer.iter().find(|a| !folded.contains(&a.trim().to_lowercase())) {
                    return Err(QuestionError::AnswerNotInChoices(missing.clone()));
                }
                QuestionKind::Multiple { choices, answer }
            }
            "text" => match raw.answer.ok_or(QuestionError::MissingField("answer"))? {
                RawAnswer::One(answer) => QuestionKind::Text { answer },
                RawAnswer::Many(_) => {
                    return Err(QuestionError::AnswerShape {
                        kind: "text",
                        expected: "a string",
                    })
                }
            },
            "cli" => {
                let accepted = raw
                    .accepted_answers
                    .ok_or(QuestionError::MissingField("accepted_answers"))?;
                if accepted.is_empty() {
                    return Err(QuestionError::Empty("accepted_answers"));
                }
                let answer = match raw.answer {
                    Some(RawAnswer::One(answer)) => Some(answer),
                    Some(RawAnswer::Many(_)) => {
                        return Err(QuestionError::AnswerShape {
                            kind: "cli",
                            expected: "a string",
                        })
                    }
                    None => None,
                };
                QuestionKind::Cli {
                    accepted_answers: accepted.into_iter().map(Pattern::from).collect(),
                    answer,
                }
            }
            other => return Err(QuestionError::UnknownType(other.to_string())),
        };

        Ok(Question {
            text,
            difficulty,
            kind,
            explanation: raw.explanation.unwrap_or_default(),
        })
    }
}

impl From<Question> for RawQuestion {
    fn from(q: Question) -> Self {
        let kind = Some(q.kind.name().to_string());
        let mut raw = RawQuestion {
            question: Some(q.text),
            difficulty: Some(q.difficulty.as_str().to_string()),
            kind,
            explanation: Some(q.explanation),
            ..RawQuestion::default()
        };
        match q.kind {
            QuestionKind::Mcq { choices, answer } => {
                raw.choices = Some(choices);
                raw.answer = Some(RawAnswer::One(answer));
            }
            QuestionKind::Multiple { choices, answer } => {
                raw.choices = Some(choices);
                raw.answer = Some(RawAnswer::Many(answer));
            }
            QuestionKind::Text { answer } => raw.answer = Some(RawAnswer::One(answer)),
            QuestionKind::Cli {
                accepted_answers,
                answer,
            } => {
                raw.accepted_answers = Some(accepted_answers.into_iter().map(String::from).collect());
                raw.answer = answer.map(RawAnswer::One);
            }
        }
        raw
    }
}
