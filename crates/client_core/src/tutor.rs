//! Interactive tutor: the client-side mirror of the server's conversation
//! state machine, and the turn loop that feeds it.

use std::{collections::BTreeMap, fmt, sync::Arc};

use shared::{domain::TutorPhase, protocol::TutorRequest};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    error::{ClientError, Result},
    speech::{speak_exclusive, RecognitionEvent},
    state::ClientEvent,
    StudyClient,
};

pub const TUTOR_GREETING: &str = "Starting session... (Say 'Math' or 'Science' to begin)";
pub const TUTOR_OFFLINE: &str = "Tutor is currently offline.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    You,
    Ai,
    System,
}

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Self::You => "You",
            Self::Ai => "AI",
            Self::System => "System",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker.label(), self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TutorState {
    pub active: bool,
    pub phase: TutorPhase,
    pub context: BTreeMap<String, String>,
    pub is_listening: bool,
    pub mic_enabled: bool,
}

/// Local override of the server's declared next phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTransition {
    pub next: TutorPhase,
    /// Context key that records the raw input, if any.
    pub context_key: Option<&'static str>,
}

/// Client-side advance along the opening of a tutor conversation.
///
/// Keyed on the phase the turn was sent from. For the first three steps the
/// result replaces whatever phase the server answered with; empty input and
/// any phase from `TEACHING` on yield `None` and the server is trusted.
pub fn local_transition_policy(pre_call: &TutorPhase, user_input: &str) -> Option<LocalTransition> {
    if user_input.is_empty() {
        return None;
    }
    match pre_call {
        TutorPhase::Start => Some(LocalTransition {
            next: TutorPhase::SubjectSelected,
            context_key: Some("subject"),
        }),
        TutorPhase::SubjectSelected => Some(LocalTransition {
            next: TutorPhase::TopicSelected,
            context_key: Some("topic"),
        }),
        TutorPhase::TopicSelected => Some(LocalTransition {
            next: TutorPhase::Teaching,
            context_key: None,
        }),
        TutorPhase::Teaching | TutorPhase::Other(_) => None,
    }
}

impl TutorState {
    pub fn restart(&mut self) {
        self.active = true;
        self.phase = TutorPhase::Start;
        self.context.clear();
    }

    pub fn request(&self, user_input: &str) -> TutorRequest {
        TutorRequest {
            state: self.phase.clone(),
            context: self.context.clone(),
            user_input: user_input.to_string(),
        }
    }

    pub fn apply_turn(&mut self, pre_call: &TutorPhase, user_input: &str, server_state: TutorPhase) {
        let next = match local_transition_policy(pre_call, user_input) {
            Some(transition) => {
                if let Some(key) = transition.context_key {
                    self.context.insert(key.to_string(), user_input.to_string());
                }
                transition.next
            }
            None => server_state,
        };

        match (self.phase.rank(), next.rank()) {
            (Some(current), Some(candidate)) if candidate < current => {
                warn!(
                    current = %self.phase,
                    rejected = %next,
                    "tutor phase would regress; keeping current phase"
                );
            }
            _ => self.phase = next,
        }
    }
}

impl StudyClient {
    /// Resets the conversation to `START` and primes it with an empty turn.
    pub async fn start_tutor(&self) {
        self.publish(ClientEvent::TutorSessionStarted).await;
        self.publish(ClientEvent::TranscriptAppended(TranscriptEntry::new(
            Speaker::Ai,
            TUTOR_GREETING,
        )))
        .await;
        self.tutor_turn("").await;
        let listening = self.state.lock().await.tutor.is_listening;
        self.publish(ClientEvent::MicrophoneChanged {
            enabled: true,
            listening,
        })
        .await;
    }

    /// Typed input: echoed into the transcript, then sent as a turn.
    pub async fn submit_tutor_text(&self, text: &str) {
        self.publish(ClientEvent::TranscriptAppended(TranscriptEntry::new(
            Speaker::You,
            text,
        )))
        .await;
        self.tutor_turn(text).await;
    }

    pub async fn tutor_turn(&self, user_input: &str) {
        let request = self.state.lock().await.tutor.request(user_input);
        let pre_call = request.state.clone();

        let response = match self.api.tutor_turn(&request).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "tutor request failed");
                self.publish(ClientEvent::TranscriptAppended(TranscriptEntry::new(
                    Speaker::System,
                    TUTOR_OFFLINE,
                )))
                .await;
                return;
            }
        };

        if !response.success {
            debug!(phase = %pre_call, "tutor turn not accepted by server");
            return;
        }
        let Some(reply) = response.response else {
            warn!(phase = %pre_call, "tutor reply missing from successful response");
            return;
        };

        self.publish(ClientEvent::TranscriptAppended(TranscriptEntry::new(
            Speaker::Ai,
            reply.text.clone(),
        )))
        .await;

        if let Err(err) = speak_exclusive(self.synthesizer.as_ref(), &reply.text) {
            warn!(error = %err, "failed to speak tutor reply");
        }

        self.publish(ClientEvent::TutorTurnApplied {
            pre_call,
            user_input: user_input.to_string(),
            server_state: reply.state,
        })
        .await;
    }

    /// Starts or stops the single recognition session.
    pub async fn toggle_microphone(self: &Arc<Self>) -> Result<()> {
        if !self.recognizer.is_supported() {
            self.alert(ClientError::RecognitionUnavailable.to_string())
                .await;
            return Err(ClientError::RecognitionUnavailable);
        }

        let (enabled, listening) = {
            let state = self.state.lock().await;
            (state.tutor.mic_enabled, state.tutor.is_listening)
        };
        if !enabled {
            return Err(ClientError::InvalidInput(
                "start a tutor session before using the microphone".to_string(),
            ));
        }

        if listening {
            self.recognizer.stop();
            info!("speech recognition stop requested");
            return Ok(());
        }

        let session = self.session().await;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        self.recognizer.start(events_tx)?;
        self.publish(ClientEvent::MicrophoneChanged {
            enabled: true,
            listening: true,
        })
        .await;
        self.spawn_recognition_pump(session, events_rx);
        Ok(())
    }

    fn spawn_recognition_pump(
        self: &Arc<Self>,
        session: u64,
        mut events: mpsc::UnboundedReceiver<RecognitionEvent>,
    ) {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if client.session().await != session {
                    debug!(?event, "recognition event from a previous session dropped");
                    break;
                }
                let finished = matches!(event, RecognitionEvent::End);
                client.handle_recognition_event(event).await;
                if finished {
                    break;
                }
            }
        });
    }

    pub async fn handle_recognition_event(self: &Arc<Self>, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Result(transcript) => {
                let client = Arc::clone(self);
                tokio::spawn(async move {
                    client.submit_tutor_text(&transcript).await;
                });
            }
            RecognitionEvent::Error(reason) => {
                error!(reason = %reason, "speech recognition error");
                self.mark_not_listening().await;
            }
            RecognitionEvent::End => self.mark_not_listening().await,
        }
    }

    async fn mark_not_listening(&self) {
        let enabled = self.state.lock().await.tutor.mic_enabled;
        self.publish(ClientEvent::MicrophoneChanged {
            enabled,
            listening: false,
        })
        .await;
    }
}

#[cfg(test)]
#[path = "tests/tutor_tests.rs"]
mod tests;
