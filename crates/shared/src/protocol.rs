use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    domain::{Language, StudentId, TaskId, TutorPhase},
    error::ApiError,
};

pub const DEFAULT_EXAM_DATE: &str = "2026-06-01";
pub const DEFAULT_DIFFICULTY: &str = "medium";
pub const BREAK_SUBJECT: &str = "Break";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    #[serde(default)]
    pub exam_date: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl Subject {
    /// Subject entered by hand, with the placeholder exam date and medium difficulty.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exam_date: DEFAULT_EXAM_DATE.to_string(),
            difficulty: DEFAULT_DIFFICULTY.to_string(),
            topics: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSyncRequest {
    pub student_id: StudentId,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileLookupResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub profile: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub failure: ApiError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub student_id: StudentId,
    pub daily_hours: f64,
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanGenerationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(flatten)]
    pub failure: ApiError,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyPlanResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub plan: Option<WeeklyPlan>,
    #[serde(flatten)]
    pub failure: ApiError,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    #[serde(default)]
    pub days: Vec<PlanDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDay {
    pub date: String,
    #[serde(default)]
    pub schedule: Vec<ScheduleSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub time_slot: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub subject: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyllabusUploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub extracted_data: Option<ExtractedSyllabus>,
    #[serde(flatten)]
    pub failure: ApiError,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSyllabus {
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoubtRequest {
    pub doubt: String,
    pub mode: Language,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoubtResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(flatten)]
    pub failure: ApiError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorRequest {
    pub state: TutorPhase,
    pub context: BTreeMap<String, String>,
    pub user_input: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TutorResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<TutorReply>,
    #[serde(flatten)]
    pub failure: ApiError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorReply {
    pub text: String,
    pub state: TutorPhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotivationRequest {
    pub student_id: StudentId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MotivationResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainPlanRequest {
    pub plan: ExplainPlanPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainPlanPayload {
    pub date: String,
    pub total_study_hours: u32,
    pub schedule: Vec<ExplainPlanSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainPlanSlot {
    pub activities: Vec<PlanTask>,
}

impl ExplainPlanRequest {
    /// Wraps today's task list the way the explainer expects a one-slot plan.
    pub fn for_today(tasks: Vec<PlanTask>) -> Self {
        Self {
            plan: ExplainPlanPayload {
                date: "Today".to_string(),
                total_study_hours: 6,
                schedule: vec![ExplainPlanSlot { activities: tasks }],
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplainPlanResponse {
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreakResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub streak: Option<Streak>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: Option<u32>,
    #[serde(default)]
    pub last_study_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub progress: Option<Progress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub total_tasks: Option<u32>,
    #[serde(default)]
    pub completed_tasks: Option<u32>,
    #[serde(default)]
    pub completion_percentage: Option<f64>,
}

impl Progress {
    /// Whole-percent label, treating a missing percentage as zero.
    pub fn percent_label(&self) -> String {
        let pct = self.completion_percentage.unwrap_or(0.0).round() as i64;
        format!("{pct}%")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodayPlanResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub today_plan: Vec<PlanTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTask {
    pub task_id: TaskId,
    pub start_time: String,
    pub end_time: String,
    pub subject: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlanTask {
    pub fn is_break(&self) -> bool {
        self.subject == BREAK_SUBJECT
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
