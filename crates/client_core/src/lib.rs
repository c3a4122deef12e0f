use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use shared::{
    domain::{Language, StudentId, TaskId},
    protocol::{DoubtRequest, ExplainPlanRequest, PlanTask, ProfileLookupResponse, ProfileSyncRequest},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

pub mod api;
pub mod error;
pub mod plan_view;
pub mod profile;
pub mod speech;
pub mod state;
pub mod syllabus;
mod tasks;
pub mod tutor;

pub use api::{HttpStudyApi, StudyApi};
pub use error::{ClientError, Result};
pub use profile::{MemoryProfileStore, ProfileStore, UserProfile};
pub use state::{AppState, ClientEvent, Screen};
pub use syllabus::{SubmissionOutcome, SyllabusFile};
pub use tasks::spawn_best_effort;

use plan_view::{render_daily, render_overall, PlanPanel, PlanView, DAILY_ERROR_TEXT, LOADING_TEXT};
use speech::{
    MissingSpeechRecognizer, MissingSpeechSynthesizer, SpeechRecognizer, SpeechSynthesizer,
};
use state::BusyAction;

pub const MOTIVATION_FALLBACK: &str = "Keep going!";

/// Blocking question to the user, answered with free text.
///
/// `None` means the prompt was dismissed.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn prompt(&self, message: &str) -> Option<String>;
}

/// Dismisses every prompt.
pub struct MissingPrompter;

#[async_trait]
impl Prompter for MissingPrompter {
    async fn prompt(&self, _message: &str) -> Option<String> {
        None
    }
}

pub struct StudyClient {
    api: Arc<dyn StudyApi>,
    profiles: Arc<dyn ProfileStore>,
    prompter: Arc<dyn Prompter>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    recognizer: Arc<dyn SpeechRecognizer>,
    state: Mutex<AppState>,
    events: broadcast::Sender<ClientEvent>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl StudyClient {
    pub fn new(api: Arc<dyn StudyApi>, profiles: Arc<dyn ProfileStore>) -> Arc<Self> {
        Self::new_with_dependencies(
            api,
            profiles,
            Arc::new(MissingPrompter),
            Arc::new(MissingSpeechSynthesizer),
            Arc::new(MissingSpeechRecognizer),
        )
    }

    pub fn new_with_dependencies(
        api: Arc<dyn StudyApi>,
        profiles: Arc<dyn ProfileStore>,
        prompter: Arc<dyn Prompter>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            api,
            profiles,
            prompter,
            synthesizer,
            recognizer,
            state: Mutex::new(AppState::default()),
            events,
            background: Mutex::new(Vec::new()),
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.lock().await.clone()
    }

    async fn publish(&self, event: ClientEvent) {
        self.state.lock().await.apply(&event);
        let _ = self.events.send(event);
    }

    async fn session(&self) -> u64 {
        self.state.lock().await.session
    }

    /// Publishes only if no reset happened since `session` was read.
    async fn publish_in_session(&self, session: u64, event: ClientEvent) -> bool {
        let mut state = self.state.lock().await;
        if state.session != session {
            debug!(session, current = state.session, "dropping event from a previous session");
            return false;
        }
        state.apply(&event);
        let _ = self.events.send(event);
        true
    }

    async fn track(&self, handle: JoinHandle<()>) {
        let mut background = self.background.lock().await;
        background.retain(|task| !task.is_finished());
        background.push(handle);
    }

    /// Waits up to `limit` for the dashboard's background requests.
    ///
    /// Front-ends that exit right after a command call this so the profile
    /// sync and plan explanation are not cut off.
    pub async fn settle_background(&self, limit: Duration) {
        let handles = std::mem::take(&mut *self.background.lock().await);
        let pending = handles.len();
        let joined = async {
            for handle in handles {
                if let Err(err) = handle.await {
                    debug!(error = %err, "background request did not complete");
                }
            }
        };
        if tokio::time::timeout(limit, joined).await.is_err() {
            warn!(pending, "background requests still running");
        }
    }

    async fn alert(&self, message: impl Into<String>) {
        let message = message.into();
        info!(alert = %message, "alert raised");
        self.publish(ClientEvent::Alert(message)).await;
    }

    /// Id of the signed-in student, or the shared `default` id.
    pub async fn student_id(&self) -> StudentId {
        self.state
            .lock()
            .await
            .profile
            .as_ref()
            .map(|profile| profile.id.clone())
            .unwrap_or_default()
    }

    async fn language(&self) -> Language {
        self.state
            .lock()
            .await
            .profile
            .as_ref()
            .map(|profile| profile.language)
            .unwrap_or_default()
    }

    /// Restores the persisted profile and opens the matching screen.
    pub async fn load(self: &Arc<Self>) -> Result<()> {
        match self.profiles.load().await? {
            Some(profile) => {
                info!(student_id = %profile.id, "restored saved profile");
                self.show_dashboard(profile).await;
            }
            None => {
                self.publish(ClientEvent::ScreenChanged(Screen::Setup)).await;
            }
        }
        Ok(())
    }

    pub async fn setup(self: &Arc<Self>, name: &str, language: Language) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            self.alert("Please enter your name!").await;
            return Ok(());
        }
        let profile = UserProfile::new(name, language);
        self.profiles.save(&profile).await?;
        info!(student_id = %profile.id, language = language.as_str(), "profile created");
        self.show_dashboard(profile).await;
        Ok(())
    }

    async fn show_dashboard(self: &Arc<Self>, mut profile: UserProfile) {
        let greeting = format!("Hello, {}! 👋", profile.name);
        profile.refresh_id();
        let sync = ProfileSyncRequest {
            student_id: profile.id.clone(),
            name: profile.name.clone(),
        };
        self.publish(ClientEvent::ProfileChanged(Some(profile))).await;
        self.publish(ClientEvent::ScreenChanged(Screen::Dashboard { greeting }))
            .await;

        let api = Arc::clone(&self.api);
        self.track(spawn_best_effort("profile_sync", async move {
            api.sync_profile(&sync).await
        }))
        .await;

        let (_, explain, _) = tokio::join!(
            self.load_motivation(),
            self.load_today_plan(),
            self.load_stats()
        );
        if let Some(explain) = explain {
            self.track(explain).await;
        }
    }

    /// Forgets the profile locally and on disk.
    ///
    /// Requests still in flight finish in the background, but their results
    /// are not applied to the next session.
    pub async fn logout(&self) -> Result<()> {
        self.profiles.clear().await?;
        let listening = self.state.lock().await.tutor.is_listening;
        if listening {
            self.recognizer.stop();
        }
        self.synthesizer.cancel();
        self.publish(ClientEvent::SessionReset).await;
        info!("logged out");
        Ok(())
    }

    pub async fn load_motivation(&self) {
        let student_id = self.student_id().await;
        let text = match self.api.motivation(&student_id).await {
            Ok(response) => match response.message {
                Some(message) => format!("\"{message}\""),
                None => MOTIVATION_FALLBACK.to_string(),
            },
            Err(err) => {
                warn!(error = %err, "motivation request failed");
                MOTIVATION_FALLBACK.to_string()
            }
        };
        self.publish(ClientEvent::MotivationUpdated(text)).await;
    }

    /// Streak first, then progress; the first failure ends the refresh.
    pub async fn load_stats(&self) {
        let student_id = self.student_id().await;

        let streak = match self.api.streak(&student_id).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "stats load failed at streak");
                return;
            }
        };
        if let (true, Some(streak)) = (streak.success, streak.streak) {
            self.publish(ClientEvent::StreakUpdated(streak.current_streak))
                .await;
        }

        let progress = match self.api.progress(&student_id, None).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "stats load failed at progress");
                return;
            }
        };
        if let (true, Some(progress)) = (progress.success, progress.progress) {
            self.publish(ClientEvent::ProgressUpdated(progress.percent_label()))
                .await;
        }
    }

    /// Reloads today's plan into the panel.
    ///
    /// Returns the explain-plan request when one was issued for a non-empty plan.
    pub async fn load_today_plan(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        self.publish(ClientEvent::PlanPanelUpdated(PlanPanel::Loading(
            LOADING_TEXT.to_string(),
        )))
        .await;

        let session = self.session().await;
        let student_id = self.student_id().await;
        let response = match self.api.today_plan(&student_id).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "failed to load today's plan");
                self.publish(ClientEvent::PlanPanelUpdated(PlanPanel::Error(
                    DAILY_ERROR_TEXT.to_string(),
                )))
                .await;
                return None;
            }
        };

        let tasks = if response.success {
            response.today_plan
        } else {
            Vec::new()
        };
        self.publish(ClientEvent::PlanPanelUpdated(render_daily(&tasks)))
            .await;
        if tasks.is_empty() {
            return None;
        }
        Some(self.spawn_explain_plan(session, tasks))
    }

    fn spawn_explain_plan(self: &Arc<Self>, session: u64, tasks: Vec<PlanTask>) -> JoinHandle<()> {
        let client = Arc::clone(self);
        let request = ExplainPlanRequest::for_today(tasks);
        spawn_best_effort("explain_plan", async move {
            let response = client.api.explain_plan(&request).await?;
            if let Some(explanation) = response.explanation {
                client
                    .publish_in_session(session, ClientEvent::ExplanationUpdated(explanation))
                    .await;
            }
            Ok(())
        })
    }

    pub async fn show_daily_view(self: &Arc<Self>) {
        self.publish(ClientEvent::PlanViewChanged(PlanView::Daily)).await;
        self.load_today_plan().await;
    }

    /// Renders the cached weekly plan; never fetches.
    pub async fn show_overall_view(&self) {
        self.publish(ClientEvent::PlanViewChanged(PlanView::Overall))
            .await;
        let panel = render_overall(self.state.lock().await.overall_schedule.as_ref());
        self.publish(ClientEvent::PlanPanelUpdated(panel)).await;
    }

    /// Marks a task done, then refreshes plan, stats and motivation independently.
    pub async fn complete_task(self: &Arc<Self>, task_id: &TaskId) {
        let student_id = self.student_id().await;
        if let Err(err) = self.api.complete_task(task_id, &student_id).await {
            error!(task_id = task_id.0, error = %err, "task completion failed");
        }
        tokio::join!(
            self.load_today_plan(),
            self.load_stats(),
            self.load_motivation()
        );
    }

    pub async fn solve_doubt(&self, doubt: &str) {
        let doubt = doubt.trim();
        if doubt.is_empty() {
            self.alert("Please enter your doubt!").await;
            return;
        }

        self.publish(ClientEvent::BusyChanged {
            action: BusyAction::Doubt,
            busy: true,
        })
        .await;
        self.publish(ClientEvent::DoubtAnswerChanged(None)).await;

        let request = DoubtRequest {
            doubt: doubt.to_string(),
            mode: self.language().await,
        };
        match self.api.solve_doubt(&request).await {
            Ok(response) if response.success => {
                self.publish(ClientEvent::DoubtAnswerChanged(Some(
                    response.answer.unwrap_or_default(),
                )))
                .await;
                self.publish(ClientEvent::DoubtSolved).await;
                self.load_stats().await;
            }
            Ok(response) => {
                self.alert(format!("Error: {}", response.failure.display_message()))
                    .await;
            }
            Err(err) => {
                error!(error = %err, "doubt request failed");
                self.alert("Doubt solving failed.").await;
            }
        }

        self.publish(ClientEvent::BusyChanged {
            action: BusyAction::Doubt,
            busy: false,
        })
        .await;
    }

    pub async fn fetch_server_profile(&self) -> Result<ProfileLookupResponse> {
        let student_id = self.student_id().await;
        self.api.fetch_profile(&student_id).await
    }

    pub async fn health(&self) -> Result<Value> {
        self.api.health().await
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
