use std::fmt::Write;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use super::Listing;
use crate::error::LoadError;
use crate::store;

/// Reference walk-through of a configuration task. Read-only.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub title: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub full_config_snippet: String,
}

impl Scenario {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "{}", self.title);
        if !self.difficulty.is_empty() {
            let _ = write!(out, " [{}]", self.difficulty);
        }
        out.push('\n');
        if !self.summary.is_empty() {
            let _ = writeln!(out, "\n{}", self.summary);
        }
        render_list(&mut out, "Prerequisites", &self.prerequisites, false);
        render_list(&mut out, "Objectives", &self.objectives, false);
        render_list(&mut out, "Steps", &self.steps, true);
        if !self.full_config_snippet.is_empty() {
            let _ = writeln!(out, "\nFull configuration:\n{}", self.full_config_snippet);
        }
        out.trim_end().to_string()
    }
}

fn render_list(out: &mut String, heading: &str, items: &[String], numbered: bool) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}:", heading);
    for (i, item) in items.iter().enumerate() {
        if numbered {
            let _ = writeln!(out, "{}. {}", i + 1, item);
        } else {
            let _ = writeln!(out, "- {}", item);
        }
    }
}

pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>, LoadError> {
    let scenarios = store::read_json::<Listing<Scenario>>(path)?.into_vec();
    info!("Loaded {} scenarios from {}", scenarios.len(), path.display());
    Ok(scenarios)
}

pub fn load_scenarios_or_empty(path: &Path) -> Vec<Scenario> {
    load_scenarios(path).unwrap_or_else(|err| {
        warn!("No scenarios available: {}", err);
        Vec::new()
    })
}
