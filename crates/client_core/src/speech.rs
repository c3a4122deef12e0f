//! Speech capabilities injected into the tutor.
//!
//! Both resources are exclusive: one utterance speaks at a time (callers
//! cancel before speaking) and one recognition session listens at a time.

use std::{
    process::{Child, Command, Stdio},
    sync::{Arc, Mutex, MutexGuard},
};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

pub const MIC_IDLE_LABEL: &str = "🎤 Speak";
pub const MIC_LISTENING_LABEL: &str = "🔴 Listening...";

pub fn mic_label(listening: bool) -> &'static str {
    if listening {
        MIC_LISTENING_LABEL
    } else {
        MIC_IDLE_LABEL
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47 locale tag such as `en-IN`.
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<Voice>,
}

pub trait SpeechSynthesizer: Send + Sync {
    fn is_speaking(&self) -> bool;
    fn cancel(&self);
    fn voices(&self) -> Vec<Voice>;
    fn speak(&self, utterance: Utterance) -> Result<()>;
}

/// Prefers an Indian-locale voice, then whatever comes first.
pub fn select_voice(voices: &[Voice]) -> Option<Voice> {
    voices
        .iter()
        .find(|voice| voice.lang.contains("IN"))
        .or_else(|| voices.first())
        .cloned()
}

/// Cancels any in-flight utterance, then speaks `text` with the preferred voice.
pub fn speak_exclusive(synth: &dyn SpeechSynthesizer, text: &str) -> Result<()> {
    if synth.is_speaking() {
        synth.cancel();
    }
    let voice = select_voice(&synth.voices());
    synth.speak(Utterance {
        text: text.to_string(),
        voice,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Result(String),
    Error(String),
    End,
}

/// Single-utterance recognizer. A session emits at most one `Result`, and
/// always finishes with `End` unless the receiver is gone.
pub trait SpeechRecognizer: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }
    fn start(&self, events: mpsc::UnboundedSender<RecognitionEvent>) -> Result<()>;
    fn stop(&self);
}

pub struct MissingSpeechSynthesizer;

impl SpeechSynthesizer for MissingSpeechSynthesizer {
    fn is_speaking(&self) -> bool {
        false
    }

    fn cancel(&self) {}

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&self, utterance: Utterance) -> Result<()> {
        debug!(chars = utterance.text.len(), "speech output unavailable; utterance dropped");
        Ok(())
    }
}

pub struct MissingSpeechRecognizer;

impl SpeechRecognizer for MissingSpeechRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&self, _events: mpsc::UnboundedSender<RecognitionEvent>) -> Result<()> {
        Err(ClientError::RecognitionUnavailable)
    }

    fn stop(&self) {}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Speaks by running an external TTS program.
///
/// `{text}` and `{voice}` in the argument list are substituted; when no
/// argument mentions `{text}` the text is appended as the last argument.
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    voices: Vec<Voice>,
    child: Mutex<Option<Child>>,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>, args: Vec<String>, voice_tags: Vec<String>) -> Self {
        let voices = voice_tags
            .into_iter()
            .map(|tag| Voice {
                name: tag.clone(),
                lang: tag,
            })
            .collect();
        Self {
            program: program.into(),
            args,
            voices,
            child: Mutex::new(None),
        }
    }

    fn render_args(&self, utterance: &Utterance) -> Vec<String> {
        let voice = utterance
            .voice
            .as_ref()
            .map(|v| v.lang.as_str())
            .unwrap_or_default();
        let mut has_text = false;
        let mut rendered: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                has_text |= arg.contains("{text}");
                // voice first, so placeholders inside the text stay literal
                arg.replace("{voice}", voice)
                    .replace("{text}", &utterance.text)
            })
            .collect();
        if !has_text {
            rendered.push(utterance.text.clone());
        }
        rendered
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn is_speaking(&self) -> bool {
        let mut guard = lock(&self.child);
        let status = guard.as_mut().map(Child::try_wait);
        match status {
            Some(Ok(None)) => true,
            Some(_) => {
                guard.take();
                false
            }
            None => false,
        }
    }

    fn cancel(&self) {
        if let Some(mut child) = lock(&self.child).take() {
            if let Err(err) = child.kill() {
                debug!(error = %err, "tts process already finished");
            }
            let _ = child.wait();
        }
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&self, utterance: Utterance) -> Result<()> {
        let child = Command::new(&self.program)
            .args(self.render_args(&utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| ClientError::Speech(format!("failed to run '{}': {err}", self.program)))?;
        if let Some(mut previous) = lock(&self.child).replace(child) {
            let _ = previous.kill();
            let _ = previous.wait();
        }
        Ok(())
    }
}

struct ActiveRecognition {
    session: u64,
    cancel: oneshot::Sender<()>,
}

/// Listens by running an external STT program that prints one transcript to stdout.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    active: Arc<Mutex<Option<ActiveRecognition>>>,
    next_session: Mutex<u64>,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            active: Arc::new(Mutex::new(None)),
            next_session: Mutex::new(0),
        }
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn start(&self, events: mpsc::UnboundedSender<RecognitionEvent>) -> Result<()> {
        let mut active = lock(&self.active);
        if active.is_some() {
            return Err(ClientError::Speech(
                "a recognition session is already listening".to_string(),
            ));
        }

        let child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ClientError::Speech(format!("failed to run '{}': {err}", self.program)))?;

        let session = {
            let mut next = lock(&self.next_session);
            *next += 1;
            *next
        };
        let (cancel, cancelled) = oneshot::channel();
        *active = Some(ActiveRecognition { session, cancel });
        drop(active);

        let registry = Arc::clone(&self.active);
        tokio::spawn(async move {
            tokio::select! {
                output = child.wait_with_output() => match output {
                    Ok(output) if output.status.success() => {
                        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
                        if !transcript.is_empty() {
                            let _ = events.send(RecognitionEvent::Result(transcript));
                        }
                    }
                    Ok(output) => {
                        warn!(status = %output.status, "speech recognizer exited unsuccessfully");
                        let _ = events.send(RecognitionEvent::Error(format!(
                            "recognizer exited with {}",
                            output.status
                        )));
                    }
                    Err(err) => {
                        let _ = events.send(RecognitionEvent::Error(err.to_string()));
                    }
                },
                _ = cancelled => debug!(session, "speech recognition stopped"),
            }

            let mut guard = lock(&registry);
            if guard.as_ref().map(|a| a.session) == Some(session) {
                guard.take();
            }
            drop(guard);
            let _ = events.send(RecognitionEvent::End);
        });

        Ok(())
    }

    fn stop(&self) {
        if let Some(active) = lock(&self.active).take() {
            let _ = active.cancel.send(());
        }
    }
}

#[cfg(test)]
#[path = "tests/speech_tests.rs"]
mod tests;
