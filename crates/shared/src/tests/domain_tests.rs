use super::*;

#[test]
fn student_id_collapses_whitespace_runs_and_lowercases() {
    assert_eq!(StudentId::from_name("Asha Rani").as_str(), "asha_rani_v1");
    assert_eq!(
        StudentId::from_name("Ravi \t  Kumar Singh").as_str(),
        "ravi_kumar_singh_v1"
    );
    assert_eq!(StudentId::from_name("MEERA").as_str(), "meera_v1");
}

#[test]
fn tutor_phase_uses_screaming_wire_names() {
    let encoded = serde_json::to_string(&TutorPhase::SubjectSelected).expect("encode");
    assert_eq!(encoded, "\"SUBJECT_SELECTED\"");

    let decoded: TutorPhase = serde_json::from_str("\"TEACHING\"").expect("decode");
    assert_eq!(decoded, TutorPhase::Teaching);
}

#[test]
fn unknown_tutor_phase_is_kept_verbatim() {
    let decoded: TutorPhase = serde_json::from_str("\"QUIZ\"").expect("decode");
    assert_eq!(decoded, TutorPhase::Other("QUIZ".to_string()));
    assert_eq!(decoded.rank(), None);
    assert_eq!(serde_json::to_string(&decoded).expect("encode"), "\"QUIZ\"");
}

#[test]
fn language_parses_user_input_and_serializes_lowercase() {
    assert_eq!("Hindi".parse::<Language>(), Ok(Language::Hindi));
    assert!("klingon".parse::<Language>().is_err());
    assert_eq!(
        serde_json::to_string(&Language::Hinglish).expect("encode"),
        "\"hinglish\""
    );
}
