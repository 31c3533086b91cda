pub mod pattern;
pub mod scenario;
pub mod session;
pub mod simulated;

use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::error::LoadError;
use crate::store;
use pattern::Pattern;
use simulated::SimulatedResponses;

const DEFAULT_SUCCESS_OUTPUT: &str = "Command accepted.";

#[derive(Debug, Clone, Deserialize)]
pub struct Lab {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub diagram: Option<Diagram>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub simulated: SimulatedResponses,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Commands suggested to the learner for this step.
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub expected: Vec<Pattern>,
    #[serde(default = "default_success_output")]
    pub success_output: String,
}

fn default_success_output() -> String {
    DEFAULT_SUCCESS_OUTPUT.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Diagram {
    #[serde(default)]
    pub nodes: Vec<DiagramNode>,
    #[serde(default)]
    pub links: Vec<DiagramLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagramNode {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagramLink {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl Diagram {
    /// Plain-text topology: one line per link, `A --label-- B`.
    pub fn describe(&self) -> String {
        let name = |id: &str| -> String {
            self.nodes
                .iter()
                .find(|n| n.id == id)
                .and_then(|n| n.label.clone())
                .unwrap_or_else(|| id.to_string())
        };
        let mut lines: Vec<String> = self
            .links
            .iter()
            .map(|link| match &link.label {
                Some(label) => format!("{} --{}-- {}", name(&link.from), label, name(&link.to)),
                None => format!("{} ---- {}", name(&link.from), name(&link.to)),
            })
            .collect();
        // Nodes without any link would otherwise disappear from the picture.
        for node in &self.nodes {
            if !self.links.iter().any(|l| l.from == node.id || l.to == node.id) {
                lines.push(name(&node.id));
            }
        }
        lines.join("\n")
    }
}

/// Content files come either as a bare array or wrapped as `{"<key>": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Labs { labs: Vec<T> },
    Scenarios { scenarios: Vec<T> },
    Questions { questions: Vec<T> },
}

impl<T> Listing<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Labs { labs } => labs,
            Listing::Scenarios { scenarios } => scenarios,
            Listing::Questions { questions } => questions,
        }
    }
}

pub fn load_labs(path: &Path) -> Result<Vec<Lab>, LoadError> {
    let labs = store::read_json::<Listing<Lab>>(path)?.into_vec();
    info!("Loaded {} labs from {}", labs.len(), path.display());
    Ok(labs)
}

/// Labs are optional content: a missing or broken file leaves the Labs menu
/// empty instead of stopping the bot.
pub fn load_labs_or_empty(path: &Path) -> Vec<Lab> {
    load_labs(path).unwrap_or_else(|err| {
        warn!("No labs available: {}", err);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_labs_with_defaults() {
        let listing: Listing<Lab> = serde_json::from_str(
            r#"{"labs": [{
                "title": "Basic router setup",
                "steps": [{"title": "Privileged mode", "expected": ["enable"]}]
            }]}"#,
        )
        .unwrap();
        let labs = listing.into_vec();
        assert_eq!(labs.len(), 1);
        assert_eq!(labs[0].steps[0].success_output, "Command accepted.");
        assert!(labs[0].simulated.is_empty());
        assert!(labs[0].diagram.is_none());
    }

    #[test]
    fn parses_bare_array() {
        let listing: Listing<Lab> =
            serde_json::from_str(r#"[{"title": "a"}, {"title": "b"}]"#).unwrap();
        assert_eq!(listing.into_vec().len(), 2);
    }

    #[test]
    fn describes_topology() {
        let diagram: Diagram = serde_json::from_str(
            r#"{
                "nodes": [{"id": "r1", "label": "R1"}, {"id": "sw1"}, {"id": "pc"}],
                "links": [{"from": "r1", "to": "sw1", "label": "g0/0"}]
            }"#,
        )
        .unwrap();
        assert_eq!(diagram.describe(), "R1 --g0/0-- sw1\npc");
    }
}
