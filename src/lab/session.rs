use serde::{Deserialize, Serialize};

use super::pattern::{self, matches_any};
use super::{Lab, Step};

/// Where a learner is within a lab. Small and `Copy` so it can live in
/// dialogue state while the lab itself stays in shared content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Progress {
    #[default]
    NotStarted,
    InProgress(usize),
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The step was passed. `completed` is set when it was the last one.
    Accepted { completed: bool },
    /// The command did not satisfy the step; the hint is in the log.
    Rejected,
    /// The lab is not running, the command was not evaluated.
    NotRunning,
}

/// Everything one submitted command produced, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub verdict: Verdict,
    pub output: Vec<String>,
    /// The entry field should be emptied for the next step.
    pub clear_entry: bool,
}

pub struct LabSession<'a> {
    lab: &'a Lab,
    progress: Progress,
    log: Vec<String>,
}

impl<'a> LabSession<'a> {
    pub fn new(lab: &'a Lab) -> Self {
        Self::resume(lab, Progress::NotStarted)
    }

    /// Picks up a previously stored progress. An out-of-range step index
    /// (the lab file changed underneath) counts as complete.
    pub fn resume(lab: &'a Lab, progress: Progress) -> Self {
        let progress = match progress {
            Progress::InProgress(i) if i >= lab.steps.len() => Progress::Complete,
            other => other,
        };
        Self {
            lab,
            progress,
            log: Vec::new(),
        }
    }

    pub fn lab(&self) -> &'a Lab {
        self.lab
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn current_step(&self) -> Option<&'a Step> {
        match self.progress {
            Progress::InProgress(i) => self.lab.steps.get(i),
            _ => None,
        }
    }

    pub fn start(&mut self) {
        self.log.clear();
        self.progress = if self.lab.steps.is_empty() {
            Progress::Complete
        } else {
            Progress::InProgress(0)
        };
    }

    /// Back to the first step; the only way to go backwards.
    pub fn restart(&mut self) {
        self.start();
    }

    pub fn submit(&mut self, entered: &str) -> Submission {
        let index = match self.progress {
            Progress::InProgress(i) => i,
            _ => {
                return Submission {
                    verdict: Verdict::NotRunning,
                    output: Vec::new(),
                    clear_entry: false,
                }
            }
        };
        let step = &self.lab.steps[index];
        let entered = entered.trim();

        let mut output: Vec<String> = self
            .lab
            .simulated
            .respond(entered)
            .map(str::to_string)
            .collect();

        let (verdict, clear_entry) = if matches_any(&step.expected, entered) {
            output.push(step.success_output.clone());
            let next = index + 1;
            let completed = next >= self.lab.steps.len();
            self.progress = if completed {
                Progress::Complete
            } else {
                Progress::InProgress(next)
            };
            (Verdict::Accepted { completed }, true)
        } else {
            output.push(pattern::hint(&step.expected));
            (Verdict::Rejected, false)
        };

        self.log.extend(output.iter().cloned());
        Submission {
            verdict,
            output,
            clear_entry,
        }
    }
}
