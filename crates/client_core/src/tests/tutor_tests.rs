use super::*;

fn state_at(phase: TutorPhase) -> TutorState {
    TutorState {
        active: true,
        phase,
        ..Default::default()
    }
}

#[test]
fn empty_input_never_overrides_the_server() {
    for phase in [
        TutorPhase::Start,
        TutorPhase::SubjectSelected,
        TutorPhase::TopicSelected,
        TutorPhase::Teaching,
    ] {
        assert_eq!(local_transition_policy(&phase, ""), None, "{phase}");
    }
}

#[test]
fn start_with_input_selects_subject() {
    let mut state = state_at(TutorPhase::Start);
    state.apply_turn(&TutorPhase::Start, "Math", TutorPhase::Start);

    assert_eq!(state.phase, TutorPhase::SubjectSelected);
    assert_eq!(state.context.get("subject").map(String::as_str), Some("Math"));
}

#[test]
fn subject_selected_with_input_selects_topic() {
    let mut state = state_at(TutorPhase::SubjectSelected);
    state
        .context
        .insert("subject".to_string(), "Math".to_string());
    state.apply_turn(
        &TutorPhase::SubjectSelected,
        "Algebra",
        TutorPhase::SubjectSelected,
    );

    assert_eq!(state.phase, TutorPhase::TopicSelected);
    assert_eq!(state.context.get("topic").map(String::as_str), Some("Algebra"));
    assert_eq!(state.context.get("subject").map(String::as_str), Some("Math"));
}

#[test]
fn topic_selected_with_input_starts_teaching() {
    let mut state = state_at(TutorPhase::TopicSelected);
    state.apply_turn(&TutorPhase::TopicSelected, "ready", TutorPhase::Start);

    assert_eq!(state.phase, TutorPhase::Teaching);
    assert!(state.context.is_empty());
}

#[test]
fn teaching_trusts_the_server_state() {
    assert_eq!(local_transition_policy(&TutorPhase::Teaching, "next"), None);

    let mut state = state_at(TutorPhase::Teaching);
    state.apply_turn(
        &TutorPhase::Teaching,
        "next",
        TutorPhase::Other("QUIZ".to_string()),
    );
    assert_eq!(state.phase, TutorPhase::Other("QUIZ".to_string()));
}

#[test]
fn empty_priming_turn_adopts_server_state() {
    let mut state = state_at(TutorPhase::Start);
    state.apply_turn(&TutorPhase::Start, "", TutorPhase::Start);
    assert_eq!(state.phase, TutorPhase::Start);
    assert!(state.context.is_empty());
}

#[test]
fn server_cannot_regress_the_linear_path() {
    let mut state = state_at(TutorPhase::Teaching);
    state.apply_turn(&TutorPhase::Teaching, "again", TutorPhase::Start);
    assert_eq!(state.phase, TutorPhase::Teaching);
}

#[test]
fn restart_clears_context_and_phase() {
    let mut state = state_at(TutorPhase::Teaching);
    state
        .context
        .insert("subject".to_string(), "Math".to_string());

    state.restart();

    assert!(state.active);
    assert_eq!(state.phase, TutorPhase::Start);
    assert!(state.context.is_empty());
}

#[test]
fn request_carries_phase_context_and_input() {
    let mut state = state_at(TutorPhase::SubjectSelected);
    state
        .context
        .insert("subject".to_string(), "Science".to_string());

    let request = state.request("Optics");
    assert_eq!(request.state, TutorPhase::SubjectSelected);
    assert_eq!(request.user_input, "Optics");
    assert_eq!(
        serde_json::to_value(&request).expect("encode"),
        serde_json::json!({
            "state": "SUBJECT_SELECTED",
            "context": {"subject": "Science"},
            "user_input": "Optics"
        })
    );
}

#[test]
fn transcript_lines_are_prefixed_by_speaker() {
    assert_eq!(
        TranscriptEntry::new(Speaker::You, "Math").to_string(),
        "You: Math"
    );
    assert_eq!(
        TranscriptEntry::new(Speaker::Ai, "Great choice").to_string(),
        "AI: Great choice"
    );
    assert_eq!(
        TranscriptEntry::new(Speaker::System, TUTOR_OFFLINE).to_string(),
        "System: Tutor is currently offline."
    );
}
