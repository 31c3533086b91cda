use lab_tutor::lab::session::{LabSession, Progress, Verdict};
use lab_tutor::lab::Lab;

fn two_step_lab() -> Lab {
    serde_json::from_str(
        r#"{
            "title": "Two steps",
            "steps": [
                {"title": "Privileged mode", "expected": ["enable"], "success_output": "R1#"},
                {"title": "Routes", "expected": ["show ip route", "re:^show\\s+ip"]}
            ],
            "simulated": {"re:^show\\s+ip\\s+int": "GigabitEthernet0/0 is up"}
        }"#,
    )
    .unwrap()
}

#[test]
fn completes_after_exactly_two_accepted_commands() {
    let lab = two_step_lab();
    let mut session = LabSession::new(&lab);
    session.start();

    let mut accepted = 0;
    for entered in ["ENABLE", "show ip interface"] {
        if let Verdict::Accepted { .. } = session.submit(entered).verdict {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 2);
    assert_eq!(session.progress(), Progress::Complete);
    assert_eq!(
        session.log(),
        &["R1#", "GigabitEthernet0/0 is up", "Command accepted."]
    );
}

#[test]
fn wrong_attempts_then_one_right_attempt_advances_by_one() {
    let lab = two_step_lab();
    let mut session = LabSession::new(&lab);
    session.start();

    for attempt in 0..4 {
        let submission = session.submit("disable");
        assert_eq!(submission.verdict, Verdict::Rejected, "attempt {}", attempt);
        assert_eq!(session.progress(), Progress::InProgress(0));
    }
    session.submit("enable");
    assert_eq!(session.progress(), Progress::InProgress(1));

    let hint = session.submit("ping 1.1.1.1");
    assert_eq!(
        hint.output,
        vec![r"Incorrect command. Expected one of: show ip route, re:^show\s+ip"]
    );
    assert_eq!(session.progress(), Progress::InProgress(1));
}

#[test]
fn progress_survives_dialogue_storage() {
    let lab = two_step_lab();
    let mut session = LabSession::new(&lab);
    session.start();
    session.submit("enable");

    let stored = serde_json::to_string(&session.progress()).unwrap();
    let restored: Progress = serde_json::from_str(&stored).unwrap();
    let mut resumed = LabSession::resume(&lab, restored);
    assert_eq!(
        resumed.submit("show ip route").verdict,
        Verdict::Accepted { completed: true }
    );
}
