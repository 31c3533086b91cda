use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use super::question::{Difficulty, Question, QuestionKey, RawQuestion};
use crate::error::LoadError;
use crate::lab::Listing;
use crate::store;

/// Which questions a quiz draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DifficultyFilter {
    All,
    Only(Difficulty),
}

impl DifficultyFilter {
    pub fn accepts(&self, difficulty: Difficulty) -> bool {
        match self {
            DifficultyFilter::All => true,
            DifficultyFilter::Only(d) => *d == difficulty,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DifficultyFilter::All => "all",
            DifficultyFilter::Only(d) => d.as_str(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Builds a bank, dropping any question whose (difficulty, question)
    /// pair was already seen. The first occurrence wins.
    pub fn new(questions: Vec<Question>) -> Self {
        let mut bank = Self::default();
        bank.extend(questions);
        bank
    }

    /// Loads one question file, either a bare array or `{"questions": [...]}`.
    /// Every entry must validate; the first
    /// invalid one fails the whole file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let raw = store::read_json::<Listing<RawQuestion>>(path)?.into_vec();
        let questions = raw
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                Question::try_from(raw).map_err(|source| LoadError::InvalidQuestion {
                    path: path.to_path_buf(),
                    index,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(questions))
    }

    /// Merges several question files in order. Files that fail to load are
    /// skipped and their errors handed back so the caller can report them.
    pub fn load_all(paths: &[PathBuf]) -> (Self, Vec<LoadError>) {
        let mut bank = Self::default();
        let mut errors = Vec::new();
        for path in paths {
            match Self::load(path) {
                Ok(loaded) => {
                    let before = bank.len();
                    bank.extend(loaded.questions);
                    info!(
                        "Loaded {} questions from {}",
                        bank.len() - before,
                        path.display()
                    );
                }
                Err(err) => {
                    warn!("Skipping question source: {}", err);
                    errors.push(err);
                }
            }
        }
        (bank, errors)
    }

    fn extend(&mut self, questions: Vec<Question>) {
        let mut seen: HashSet<QuestionKey> = self.questions.iter().map(Question::key).collect();
        for q in questions {
            if seen.insert(q.key()) {
                self.questions.push(q);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn find(&self, key: &QuestionKey) -> Option<&Question> {
        self.questions
            .iter()
            .find(|q| q.difficulty == key.difficulty && q.text == key.question)
    }

    pub fn pool(&self, filter: DifficultyFilter) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| filter.accepts(q.difficulty))
            .collect()
    }

    /// Picks `requested` questions at random (at least one, at most the
    /// whole pool). Empty when the pool is.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        filter: DifficultyFilter,
        requested: usize,
        rng: &mut R,
    ) -> Vec<Question> {
        let pool = self.pool(filter);
        let n = requested.max(1).min(pool.len());
        pool.choose_multiple(rng, n).map(|q| (*q).clone()).collect()
    }
}
