//! Syllabus submission and plan generation flows.

use std::{path::Path, sync::Arc};

use shared::protocol::{PlanRequest, Subject};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{
    error::{ClientError, Result},
    plan_view::{parse_subject_list, PlanPanel, GENERATING_TEXT},
    state::{BusyAction, ClientEvent},
    tasks::spawn_best_effort,
    StudyClient,
};

pub const ACCEPTED_EXTENSIONS: [&str; 6] = ["pdf", "docx", "txt", "jpg", "jpeg", "png"];
pub const GENERATE_PLAN_DAILY_HOURS: f64 = 6.0;
pub const GENERATING_EXPLANATION: &str = "AI naya plan bana raha hai... 🤖";

const MANUAL_SUBJECTS_PROMPT: &str =
    "No file selected. Enter subjects (comma separated):\nExample: Mathematics, Physics, Chemistry";
const GENERATE_SUBJECTS_PROMPT: &str =
    "Enter subjects you want to study (comma separated):\nExample: Mathematics, Physics, Chemistry";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllabusFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SyllabusFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let extension = Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ClientError::InvalidInput(format!(
                "unsupported syllabus file '{file_name}'; expected one of .{}",
                ACCEPTED_EXTENSIONS.join(", .")
            )));
        }
        let mime_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ClientError::InvalidInput(format!("not a file path: {}", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(ClientError::SyllabusFile)?;
        Self::new(file_name, bytes)
    }
}

/// How a plan-generation action ended. Failures have already been alerted.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// The subject prompt was dismissed or left blank.
    Cancelled,
    Generated {
        /// Background weekly-plan request, when one was issued.
        weekly: Option<JoinHandle<()>>,
    },
    Failed,
}

impl StudyClient {
    /// Uploads a syllabus file, or asks for a subject list when none is given.
    pub async fn submit_syllabus(
        self: &Arc<Self>,
        daily_hours: f64,
        file: Option<SyllabusFile>,
    ) -> SubmissionOutcome {
        match file {
            None => self.submit_manual_subjects(daily_hours).await,
            Some(file) => {
                self.publish(ClientEvent::BusyChanged {
                    action: BusyAction::Syllabus,
                    busy: true,
                })
                .await;
                let outcome = self.upload_and_generate(daily_hours, &file).await;
                self.publish(ClientEvent::BusyChanged {
                    action: BusyAction::Syllabus,
                    busy: false,
                })
                .await;
                outcome
            }
        }
    }

    /// Generates today's plan from a prompted subject list at the default hours.
    pub async fn generate_new_plan(self: &Arc<Self>) -> SubmissionOutcome {
        let Some(subjects) = self.prompt_subjects(GENERATE_SUBJECTS_PROMPT).await else {
            return SubmissionOutcome::Cancelled;
        };
        let payload = self
            .plan_request(GENERATE_PLAN_DAILY_HOURS, subjects)
            .await;

        match self.api.generate_daily_plan(&payload).await {
            Ok(response) if response.success => {
                self.show_daily_view().await;
                self.alert("Plan generated based on your subjects!").await;
                SubmissionOutcome::Generated { weekly: None }
            }
            Ok(response) => {
                self.alert(format!(
                    "Failed to generate plan: {}",
                    response.failure.display_message()
                ))
                .await;
                SubmissionOutcome::Failed
            }
            Err(err) => {
                error!(error = %err, "plan generation request failed");
                self.alert("Server error during generation").await;
                SubmissionOutcome::Failed
            }
        }
    }

    async fn submit_manual_subjects(self: &Arc<Self>, daily_hours: f64) -> SubmissionOutcome {
        let Some(subjects) = self.prompt_subjects(MANUAL_SUBJECTS_PROMPT).await else {
            return SubmissionOutcome::Cancelled;
        };
        let payload = self.plan_request(daily_hours, subjects).await;

        match self.api.generate_daily_plan(&payload).await {
            Ok(response) if response.success => {
                self.show_daily_view().await;
                self.alert("Plan Generated Successfully based on your subjects!")
                    .await;
                SubmissionOutcome::Generated { weekly: None }
            }
            Ok(response) => {
                self.alert(format!("Failed: {}", response.failure.display_message()))
                    .await;
                SubmissionOutcome::Failed
            }
            Err(err) => {
                error!(error = %err, "manual plan generation failed");
                self.alert("Planning failed.").await;
                SubmissionOutcome::Failed
            }
        }
    }

    async fn upload_and_generate(
        self: &Arc<Self>,
        daily_hours: f64,
        file: &SyllabusFile,
    ) -> SubmissionOutcome {
        let response = match self.api.upload_syllabus(file, daily_hours).await {
            Ok(response) => response,
            Err(err) => {
                error!(file = %file.file_name, error = %err, "syllabus upload failed");
                self.alert("Upload failed.").await;
                return SubmissionOutcome::Failed;
            }
        };

        if !response.success {
            self.alert(format!("Error: {}", response.failure.display_message()))
                .await;
            return SubmissionOutcome::Failed;
        }

        self.alert("Syllabus parsed! AI is generating your schedule...")
            .await;
        let subjects = response
            .extracted_data
            .map(|data| data.subjects)
            .unwrap_or_default();
        info!(
            file = %file.file_name,
            subjects = subjects.len(),
            "syllabus extracted"
        );
        let payload = self.plan_request(daily_hours, subjects).await;
        self.generate_plan_from_syllabus(payload).await
    }

    async fn generate_plan_from_syllabus(self: &Arc<Self>, payload: PlanRequest) -> SubmissionOutcome {
        let session = self.session().await;
        match self.api.generate_daily_plan(&payload).await {
            Ok(response) if response.success => {
                let weekly = self.spawn_weekly_plan(session, payload);
                self.show_daily_view().await;
                self.alert("Schedule Generated Successfully! Check Today's Plan.")
                    .await;
                SubmissionOutcome::Generated {
                    weekly: Some(weekly),
                }
            }
            Ok(response) => {
                self.alert(format!(
                    "Failed to generate plan: {}",
                    response.failure.display_message()
                ))
                .await;
                SubmissionOutcome::Failed
            }
            Err(err) => {
                error!(error = %err, "daily plan generation failed");
                self.alert("Planning failed.").await;
                SubmissionOutcome::Failed
            }
        }
    }

    /// Fills the overall-schedule cache in the background; only success writes it.
    fn spawn_weekly_plan(self: &Arc<Self>, session: u64, payload: PlanRequest) -> JoinHandle<()> {
        let client = Arc::clone(self);
        spawn_best_effort("weekly_plan", async move {
            let response = client.api.generate_weekly_plan(&payload).await?;
            match response.plan {
                Some(plan) if response.success => {
                    let days = plan.days.len();
                    if client
                        .publish_in_session(session, ClientEvent::OverallScheduleCached(plan))
                        .await
                    {
                        info!(days, "overall schedule cached");
                    }
                }
                _ => info!("weekly plan not generated; keeping previous schedule"),
            }
            Ok(())
        })
    }

    async fn prompt_subjects(&self, message: &str) -> Option<Vec<Subject>> {
        let reply = self.prompter.prompt(message).await?;
        let subjects = parse_subject_list(&reply)?;
        self.publish(ClientEvent::ExplanationUpdated(
            GENERATING_EXPLANATION.to_string(),
        ))
        .await;
        self.publish(ClientEvent::PlanPanelUpdated(PlanPanel::Loading(
            GENERATING_TEXT.to_string(),
        )))
        .await;
        Some(subjects)
    }

    async fn plan_request(&self, daily_hours: f64, subjects: Vec<Subject>) -> PlanRequest {
        PlanRequest {
            student_id: self.student_id().await,
            daily_hours,
            subjects,
        }
    }
}

#[cfg(test)]
#[path = "tests/syllabus_tests.rs"]
mod tests;
