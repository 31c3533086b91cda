use std::fs;
use std::path::Path;

use log::warn;

const MISSING_STUDY_TEXT: &str =
    "# Study content not found.\nAdd `study_content.md` to the data folder.";

#[derive(Debug, Clone)]
pub struct StudyGuide {
    text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHits {
    /// Total occurrences, several may share a line.
    pub count: usize,
    /// 1-based line numbers with the matching line.
    pub lines: Vec<(usize, String)>,
}

impl StudyGuide {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => Self::new(text),
            Err(err) => {
                warn!("Study guide {} unavailable: {}", path.display(), err);
                Self::new(MISSING_STUDY_TEXT)
            }
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Case-insensitive search. `None` for a blank query.
    pub fn search(&self, query: &str) -> Option<SearchHits> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let mut hits = SearchHits {
            count: 0,
            lines: Vec::new(),
        };
        for (i, line) in self.text.lines().enumerate() {
            let found = line.to_lowercase().matches(needle.as_str()).count();
            if found > 0 {
                hits.count += found;
                hits.lines.push((i + 1, line.trim().to_string()));
            }
        }
        Some(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUIDE: &str = "# OSPF\nOSPF uses cost.\nospf area 0 ospf\n\n# RIP\nHop count.";

    #[test]
    fn counts_every_occurrence() {
        let hits = StudyGuide::new(GUIDE).search("OSPF").unwrap();
        assert_eq!(hits.count, 4);
        assert_eq!(
            hits.lines,
            vec![
                (1, "# OSPF".to_string()),
                (2, "OSPF uses cost.".to_string()),
                (3, "ospf area 0 ospf".to_string()),
            ]
        );
    }

    #[test]
    fn blank_query_is_rejected() {
        assert!(StudyGuide::new(GUIDE).search("   ").is_none());
    }

    #[test]
    fn no_hits() {
        let hits = StudyGuide::new(GUIDE).search("bgp").unwrap();
        assert_eq!(hits.count, 0);
        assert!(hits.lines.is_empty());
    }

    #[test]
    fn missing_file_falls_back() {
        let guide = StudyGuide::load(Path::new("/definitely/not/here.md"));
        assert!(guide.text().starts_with("# Study content not found."));
    }
}
