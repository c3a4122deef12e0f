use super::*;

use std::time::Duration;

#[derive(Default)]
struct RecordingSynthesizer {
    speaking: Mutex<bool>,
    voices: Vec<Voice>,
    cancels: Mutex<u32>,
    spoken: Mutex<Vec<Utterance>>,
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn is_speaking(&self) -> bool {
        *lock(&self.speaking)
    }

    fn cancel(&self) {
        *lock(&self.cancels) += 1;
        *lock(&self.speaking) = false;
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&self, utterance: Utterance) -> Result<()> {
        *lock(&self.speaking) = true;
        lock(&self.spoken).push(utterance);
        Ok(())
    }
}

fn voice(name: &str, lang: &str) -> Voice {
    Voice {
        name: name.to_string(),
        lang: lang.to_string(),
    }
}

#[test]
fn voice_selection_prefers_indian_locale() {
    let voices = vec![
        voice("Samantha", "en-US"),
        voice("Rishi", "en-IN"),
        voice("Lekha", "hi-IN"),
    ];
    assert_eq!(select_voice(&voices), Some(voice("Rishi", "en-IN")));
}

#[test]
fn voice_selection_falls_back_to_first_voice() {
    let voices = vec![voice("Samantha", "en-US"), voice("Daniel", "en-GB")];
    assert_eq!(select_voice(&voices), Some(voice("Samantha", "en-US")));
    assert_eq!(select_voice(&[]), None);
}

#[test]
fn speaking_cancels_in_flight_speech() {
    let synth = RecordingSynthesizer {
        voices: vec![voice("Lekha", "hi-IN")],
        ..Default::default()
    };

    speak_exclusive(&synth, "first").expect("speak");
    assert_eq!(*lock(&synth.cancels), 0);

    speak_exclusive(&synth, "second").expect("speak");
    assert_eq!(*lock(&synth.cancels), 1);

    let spoken = lock(&synth.spoken);
    assert_eq!(spoken.len(), 2);
    assert_eq!(spoken[1].text, "second");
    assert_eq!(spoken[1].voice, Some(voice("Lekha", "hi-IN")));
}

#[test]
fn microphone_label_follows_listening_state() {
    assert_eq!(mic_label(false), "🎤 Speak");
    assert_eq!(mic_label(true), "🔴 Listening...");
}

#[test]
fn command_synthesizer_substitutes_placeholders() {
    let synth = CommandSynthesizer::new(
        "espeak-ng",
        vec!["-v".to_string(), "{voice}".to_string(), "{text}".to_string()],
        vec!["en-IN".to_string()],
    );
    let args = synth.render_args(&Utterance {
        text: "namaste".to_string(),
        voice: Some(voice("en-IN", "en-IN")),
    });
    assert_eq!(args, vec!["-v", "en-IN", "namaste"]);
}

#[test]
fn command_synthesizer_keeps_placeholders_inside_text() {
    let synth = CommandSynthesizer::new(
        "espeak-ng",
        vec!["-v".to_string(), "{voice}".to_string(), "{text}".to_string()],
        vec!["hi-IN".to_string()],
    );
    let args = synth.render_args(&Utterance {
        text: "Type {voice} or {text} literally".to_string(),
        voice: Some(voice("hi-IN", "hi-IN")),
    });
    assert_eq!(args, vec!["-v", "hi-IN", "Type {voice} or {text} literally"]);
}

#[test]
fn command_synthesizer_appends_text_without_placeholder() {
    let synth = CommandSynthesizer::new("say", Vec::new(), Vec::new());
    let args = synth.render_args(&Utterance {
        text: "hello".to_string(),
        voice: None,
    });
    assert_eq!(args, vec!["hello"]);
}

#[test]
fn missing_recognizer_reports_unsupported() {
    let recognizer = MissingSpeechRecognizer;
    assert!(!recognizer.is_supported());

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = recognizer.start(tx).expect_err("unsupported");
    assert!(matches!(err, ClientError::RecognitionUnavailable));
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<RecognitionEvent>) -> RecognitionEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("recognition event in time")
        .expect("channel open")
}

#[cfg(unix)]
#[tokio::test]
async fn command_recognizer_emits_transcript_then_end() {
    let recognizer = CommandRecognizer::new("echo", vec!["Math".to_string()]);
    let (tx, mut rx) = mpsc::unbounded_channel();

    recognizer.start(tx).expect("start");

    assert_eq!(
        next_event(&mut rx).await,
        RecognitionEvent::Result("Math".to_string())
    );
    assert_eq!(next_event(&mut rx).await, RecognitionEvent::End);
}

#[cfg(unix)]
#[tokio::test]
async fn command_recognizer_allows_one_session_and_stops_on_request() {
    let recognizer = CommandRecognizer::new("sleep", vec!["30".to_string()]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    recognizer.start(tx).expect("start");

    let (second_tx, _second_rx) = mpsc::unbounded_channel();
    assert!(matches!(
        recognizer.start(second_tx),
        Err(ClientError::Speech(_))
    ));

    recognizer.stop();
    assert_eq!(next_event(&mut rx).await, RecognitionEvent::End);

    let (tx, _rx) = mpsc::unbounded_channel();
    recognizer.start(tx).expect("restart after stop");
    recognizer.stop();
}
