//! In-process fakes shared by the unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::sync::Notify;
use shared::{
    domain::{StudentId, TaskId},
    error::ApiError,
    protocol::{
        DoubtRequest, DoubtResponse, ExplainPlanRequest, ExplainPlanResponse, ExtractedSyllabus,
        MotivationResponse, PlanDay, PlanGenerationResponse, PlanRequest, PlanTask,
        ProfileLookupResponse, ProfileSyncRequest, ProgressResponse, StreakResponse, Subject,
        SyllabusUploadResponse, TodayPlanResponse, TutorRequest, TutorResponse,
        WeeklyPlan, WeeklyPlanResponse,
    },
};

use crate::{
    api::StudyApi,
    error::{ClientError, Result},
    profile::MemoryProfileStore,
    speech::{MissingSpeechRecognizer, MissingSpeechSynthesizer},
    syllabus::SyllabusFile,
    Prompter, StudyClient,
};

/// `None` in a scripted reply simulates an unreachable server.
pub(crate) struct ScriptedApi {
    pub daily: Option<PlanGenerationResponse>,
    pub weekly: Option<WeeklyPlanResponse>,
    pub upload: Option<SyllabusUploadResponse>,
    pub today: Vec<PlanTask>,
    /// When set, the weekly request waits for a `notify_one` before answering.
    pub weekly_gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<String>>,
    plan_requests: Mutex<Vec<PlanRequest>>,
}

impl ScriptedApi {
    pub fn healthy() -> Self {
        Self {
            daily: Some(PlanGenerationResponse {
                success: true,
                failure: ApiError::default(),
            }),
            weekly: Some(WeeklyPlanResponse {
                success: true,
                plan: Some(WeeklyPlan {
                    days: vec![PlanDay {
                        date: "2026-03-02".to_string(),
                        schedule: Vec::new(),
                    }],
                }),
                failure: ApiError::default(),
            }),
            upload: Some(SyllabusUploadResponse {
                success: true,
                extracted_data: Some(ExtractedSyllabus {
                    subjects: vec![Subject::with_defaults("Biology")],
                }),
                failure: ApiError::default(),
            }),
            today: Vec::new(),
            weekly_gate: None,
            calls: Mutex::new(Vec::new()),
            plan_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn plan_requests(&self) -> Vec<PlanRequest> {
        self.plan_requests.lock().expect("plan requests").clone()
    }

    fn record(&self, endpoint: &str) {
        self.calls.lock().expect("calls").push(endpoint.to_string());
    }
}

fn offline() -> ClientError {
    ClientError::InvalidInput("server unreachable".to_string())
}

#[async_trait]
impl StudyApi for ScriptedApi {
    async fn sync_profile(&self, _request: &ProfileSyncRequest) -> Result<()> {
        self.record("student/profile");
        Ok(())
    }

    async fn fetch_profile(&self, _student_id: &StudentId) -> Result<ProfileLookupResponse> {
        self.record("student/profile:get");
        Ok(ProfileLookupResponse::default())
    }

    async fn generate_daily_plan(&self, request: &PlanRequest) -> Result<PlanGenerationResponse> {
        self.record("plan/daily");
        self.plan_requests
            .lock()
            .expect("plan requests")
            .push(request.clone());
        self.daily.clone().ok_or_else(offline)
    }

    async fn generate_weekly_plan(&self, request: &PlanRequest) -> Result<WeeklyPlanResponse> {
        self.record("plan/weekly");
        self.plan_requests
            .lock()
            .expect("plan requests")
            .push(request.clone());
        if let Some(gate) = &self.weekly_gate {
            gate.notified().await;
        }
        self.weekly.clone().ok_or_else(offline)
    }

    async fn upload_syllabus(
        &self,
        _file: &SyllabusFile,
        _daily_hours: f64,
    ) -> Result<SyllabusUploadResponse> {
        self.record("plan/upload");
        self.upload.clone().ok_or_else(offline)
    }

    async fn solve_doubt(&self, _request: &DoubtRequest) -> Result<DoubtResponse> {
        self.record("ai/solve-doubt");
        Err(offline())
    }

    async fn tutor_turn(&self, _request: &TutorRequest) -> Result<TutorResponse> {
        self.record("ai/tutor");
        Err(offline())
    }

    async fn motivation(&self, _student_id: &StudentId) -> Result<MotivationResponse> {
        self.record("ai/motivation");
        Ok(MotivationResponse::default())
    }

    async fn explain_plan(&self, _request: &ExplainPlanRequest) -> Result<ExplainPlanResponse> {
        self.record("ai/explain-plan");
        Ok(ExplainPlanResponse::default())
    }

    async fn streak(&self, _student_id: &StudentId) -> Result<StreakResponse> {
        self.record("streak");
        Ok(StreakResponse::default())
    }

    async fn progress(
        &self,
        _student_id: &StudentId,
        _date: Option<NaiveDate>,
    ) -> Result<ProgressResponse> {
        self.record("progress");
        Ok(ProgressResponse::default())
    }

    async fn today_plan(&self, _student_id: &StudentId) -> Result<TodayPlanResponse> {
        self.record("plan/today");
        Ok(TodayPlanResponse {
            success: true,
            today_plan: self.today.clone(),
            message: None,
        })
    }

    async fn complete_task(&self, _task_id: &TaskId, _student_id: &StudentId) -> Result<()> {
        self.record("task/complete");
        Ok(())
    }

    async fn health(&self) -> Result<Value> {
        self.record("health");
        Ok(json!({"status": "ok"}))
    }
}

/// Answers every prompt with the same reply and remembers the questions.
pub(crate) struct ScriptedPrompter {
    reply: Option<String>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn replying(reply: Option<&str>) -> Self {
        Self {
            reply: reply.map(str::to_string),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().expect("asked").clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn prompt(&self, message: &str) -> Option<String> {
        self.asked.lock().expect("asked").push(message.to_string());
        self.reply.clone()
    }
}

pub(crate) fn scripted_client(
    api: Arc<ScriptedApi>,
    prompter: Arc<ScriptedPrompter>,
) -> Arc<StudyClient> {
    StudyClient::new_with_dependencies(
        api,
        Arc::new(MemoryProfileStore::default()),
        prompter,
        Arc::new(MissingSpeechSynthesizer),
        Arc::new(MissingSpeechRecognizer),
    )
}
