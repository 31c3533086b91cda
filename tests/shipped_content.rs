//! The content files under `data/` must load cleanly and every lab must be
//! solvable with the commands it suggests.

use std::path::PathBuf;

use lab_tutor::lab::scenario::load_scenarios;
use lab_tutor::lab::session::{LabSession, Progress, Verdict};
use lab_tutor::lab::load_labs;
use lab_tutor::quiz::{Difficulty, DifficultyFilter, QuestionBank, QuestionKind};
use lab_tutor::study::StudyGuide;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

#[test]
fn questions_load_and_validate() {
    let bank = QuestionBank::load(&data("questions.json")).unwrap();
    assert!(!bank.is_empty());
    for difficulty in Difficulty::ALL {
        assert!(
            !bank.pool(DifficultyFilter::Only(difficulty)).is_empty(),
            "no {} questions",
            difficulty
        );
    }
}

#[test]
fn every_question_accepts_its_own_answer() {
    let bank = QuestionBank::load(&data("questions.json")).unwrap();
    for question in bank.questions() {
        let reply = match &question.kind {
            QuestionKind::Multiple { answer, .. } => answer.join(", "),
            _ => question.correct_answer(),
        };
        assert!(question.check(&reply), "{:?} rejects {:?}", question.text, reply);
    }
}

#[test]
fn every_lab_is_solvable_with_its_suggested_commands() {
    let labs = load_labs(&data("labs.json")).unwrap();
    assert!(!labs.is_empty());
    for lab in &labs {
        let mut session = LabSession::new(lab);
        session.start();
        for step in &lab.steps {
            let command = step
                .commands
                .last()
                .unwrap_or_else(|| panic!("step {:?} of {:?} suggests nothing", step.title, lab.title));
            assert!(
                matches!(session.submit(command).verdict, Verdict::Accepted { .. }),
                "{:?} rejects {:?} at step {:?}",
                lab.title,
                command,
                step.title
            );
        }
        assert_eq!(session.progress(), Progress::Complete, "{:?}", lab.title);
    }
}

#[test]
fn scenarios_load() {
    let scenarios = load_scenarios(&data("scenarios.json")).unwrap();
    assert!(scenarios.iter().all(|s| !s.render().is_empty()));
}

#[test]
fn study_guide_is_searchable() {
    let guide = StudyGuide::load(&data("study_content.md"));
    let hits = guide.search("show ip route").unwrap();
    assert!(hits.count >= 1);
}
