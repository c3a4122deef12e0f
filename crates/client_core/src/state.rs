//! Application state and the events that mutate it.
//!
//! Every visible change is a [`ClientEvent`]. The client applies it to
//! [`AppState`] and then broadcasts the same event, so front-ends and tests see
//! identical transitions.

use shared::{domain::TutorPhase, protocol::WeeklyPlan};

use crate::{
    plan_view::{PlanPanel, PlanView},
    profile::UserProfile,
    tutor::{TranscriptEntry, TutorState},
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Setup,
    Dashboard {
        greeting: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyAction {
    Syllabus,
    Doubt,
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Everything back to defaults, as after a logout.
    SessionReset,
    ScreenChanged(Screen),
    ProfileChanged(Option<UserProfile>),
    Alert(String),
    MotivationUpdated(String),
    StreakUpdated(u32),
    ProgressUpdated(String),
    PlanViewChanged(PlanView),
    PlanPanelUpdated(PlanPanel),
    ExplanationUpdated(String),
    OverallScheduleCached(WeeklyPlan),
    DoubtAnswerChanged(Option<String>),
    DoubtSolved,
    BusyChanged { action: BusyAction, busy: bool },
    TutorSessionStarted,
    TutorTurnApplied {
        pre_call: TutorPhase,
        user_input: String,
        server_state: TutorPhase,
    },
    TranscriptAppended(TranscriptEntry),
    MicrophoneChanged { enabled: bool, listening: bool },
}

#[derive(Debug, Clone, Default)]
pub struct DashboardDisplay {
    pub motivation: Option<String>,
    pub streak: Option<u32>,
    pub progress: Option<String>,
    pub view: PlanView,
    pub panel: PlanPanel,
    pub explanation: Option<String>,
    pub doubt_answer: Option<String>,
    pub syllabus_busy: bool,
    pub doubt_busy: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub screen: Screen,
    pub profile: Option<UserProfile>,
    pub dashboard: DashboardDisplay,
    pub tutor: TutorState,
    pub transcript: Vec<TranscriptEntry>,
    /// Last weekly plan fetched; memory only.
    pub overall_schedule: Option<WeeklyPlan>,
    pub alerts: Vec<String>,
    /// Bumped on every reset; background results from older sessions are dropped.
    pub session: u64,
}

impl AppState {
    pub fn apply(&mut self, event: &ClientEvent) {
        match event {
            ClientEvent::SessionReset => {
                let session = self.session.wrapping_add(1);
                *self = AppState::default();
                self.session = session;
            }
            ClientEvent::ScreenChanged(screen) => self.screen = screen.clone(),
            ClientEvent::ProfileChanged(profile) => self.profile = profile.clone(),
            ClientEvent::Alert(message) => self.alerts.push(message.clone()),
            ClientEvent::MotivationUpdated(text) => self.dashboard.motivation = Some(text.clone()),
            ClientEvent::StreakUpdated(count) => self.dashboard.streak = Some(*count),
            ClientEvent::ProgressUpdated(label) => self.dashboard.progress = Some(label.clone()),
            ClientEvent::PlanViewChanged(view) => self.dashboard.view = *view,
            ClientEvent::PlanPanelUpdated(panel) => self.dashboard.panel = panel.clone(),
            ClientEvent::ExplanationUpdated(text) => {
                self.dashboard.explanation = Some(text.clone())
            }
            ClientEvent::OverallScheduleCached(plan) => self.overall_schedule = Some(plan.clone()),
            ClientEvent::DoubtAnswerChanged(answer) => self.dashboard.doubt_answer = answer.clone(),
            ClientEvent::DoubtSolved => {
                if let Some(profile) = self.profile.as_mut() {
                    profile.doubt_solved_session = true;
                }
            }
            ClientEvent::BusyChanged { action, busy } => match action {
                BusyAction::Syllabus => self.dashboard.syllabus_busy = *busy,
                BusyAction::Doubt => self.dashboard.doubt_busy = *busy,
            },
            ClientEvent::TutorSessionStarted => self.tutor.restart(),
            ClientEvent::TutorTurnApplied {
                pre_call,
                user_input,
                server_state,
            } => self
                .tutor
                .apply_turn(pre_call, user_input, server_state.clone()),
            ClientEvent::TranscriptAppended(entry) => self.transcript.push(entry.clone()),
            ClientEvent::MicrophoneChanged { enabled, listening } => {
                self.tutor.mic_enabled = *enabled;
                self.tutor.is_listening = *listening;
            }
        }
    }
}
