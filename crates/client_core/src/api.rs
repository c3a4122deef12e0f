//! HTTP contract of the study-planning server.
//!
//! Response bodies are decoded whatever the status code: the server reports
//! failures as `{error}` bodies on 4xx/5xx and callers only branch on the
//! `success` flag.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    domain::{StudentId, TaskId},
    protocol::{
        DoubtRequest, DoubtResponse, ExplainPlanRequest, ExplainPlanResponse, MotivationRequest,
        MotivationResponse, PlanGenerationResponse, PlanRequest, ProfileLookupResponse,
        ProfileSyncRequest, ProgressResponse, StreakResponse, SyllabusUploadResponse,
        TodayPlanResponse, TutorRequest, TutorResponse, WeeklyPlanResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::{error::Result, syllabus::SyllabusFile};

/// Fallback base URL; `SAATHI_API_BASE` at compile time replaces it.
pub const DEFAULT_API_BASE: &str = "https://study-saathi-3tax.onrender.com/api";

pub fn build_time_api_base() -> &'static str {
    option_env!("SAATHI_API_BASE").unwrap_or(DEFAULT_API_BASE)
}

#[async_trait]
pub trait StudyApi: Send + Sync {
    async fn sync_profile(&self, request: &ProfileSyncRequest) -> Result<()>;
    async fn fetch_profile(&self, student_id: &StudentId) -> Result<ProfileLookupResponse>;
    async fn generate_daily_plan(&self, request: &PlanRequest) -> Result<PlanGenerationResponse>;
    async fn generate_weekly_plan(&self, request: &PlanRequest) -> Result<WeeklyPlanResponse>;
    async fn upload_syllabus(
        &self,
        file: &SyllabusFile,
        daily_hours: f64,
    ) -> Result<SyllabusUploadResponse>;
    async fn solve_doubt(&self, request: &DoubtRequest) -> Result<DoubtResponse>;
    async fn tutor_turn(&self, request: &TutorRequest) -> Result<TutorResponse>;
    async fn motivation(&self, student_id: &StudentId) -> Result<MotivationResponse>;
    async fn explain_plan(&self, request: &ExplainPlanRequest) -> Result<ExplainPlanResponse>;
    async fn streak(&self, student_id: &StudentId) -> Result<StreakResponse>;
    async fn progress(
        &self,
        student_id: &StudentId,
        date: Option<NaiveDate>,
    ) -> Result<ProgressResponse>;
    async fn today_plan(&self, student_id: &StudentId) -> Result<TodayPlanResponse>;
    async fn complete_task(&self, task_id: &TaskId, student_id: &StudentId) -> Result<()>;
    async fn health(&self) -> Result<Value>;
}

#[derive(Clone)]
pub struct HttpStudyApi {
    http: Client,
    base_url: String,
}

impl HttpStudyApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)?;
        Ok(Self {
            http: Client::new(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.http.post(self.endpoint(path)).json(body).send().await?;
        decode(path, response).await
    }

    async fn get_for_student<R>(&self, path: &str, student_id: &StudentId) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self
            .http
            .get(self.endpoint(path))
            .query(&[("student_id", student_id.as_str())])
            .send()
            .await?;
        decode(path, response).await
    }
}

async fn decode<R: DeserializeOwned>(path: &str, response: Response) -> Result<R> {
    let status = response.status();
    if !status.is_success() {
        debug!(endpoint = path, status = status.as_u16(), "api answered with failure status");
    }
    Ok(response.json::<R>().await?)
}

#[async_trait]
impl StudyApi for HttpStudyApi {
    async fn sync_profile(&self, request: &ProfileSyncRequest) -> Result<()> {
        self.http
            .post(self.endpoint("student/profile"))
            .json(request)
            .send()
            .await?;
        Ok(())
    }

    async fn fetch_profile(&self, student_id: &StudentId) -> Result<ProfileLookupResponse> {
        self.get_for_student("student/profile", student_id).await
    }

    async fn generate_daily_plan(&self, request: &PlanRequest) -> Result<PlanGenerationResponse> {
        self.post_json("plan/daily", request).await
    }

    async fn generate_weekly_plan(&self, request: &PlanRequest) -> Result<WeeklyPlanResponse> {
        self.post_json("plan/weekly", request).await
    }

    async fn upload_syllabus(
        &self,
        file: &SyllabusFile,
        daily_hours: f64,
    ) -> Result<SyllabusUploadResponse> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new()
            .part("file", part)
            .text("daily_hours", daily_hours.to_string());
        let response = self
            .http
            .post(self.endpoint("plan/upload"))
            .multipart(form)
            .send()
            .await?;
        decode("plan/upload", response).await
    }

    async fn solve_doubt(&self, request: &DoubtRequest) -> Result<DoubtResponse> {
        self.post_json("ai/solve-doubt", request).await
    }

    async fn tutor_turn(&self, request: &TutorRequest) -> Result<TutorResponse> {
        self.post_json("ai/tutor", request).await
    }

    async fn motivation(&self, student_id: &StudentId) -> Result<MotivationResponse> {
        self.post_json(
            "ai/motivation",
            &MotivationRequest {
                student_id: student_id.clone(),
            },
        )
        .await
    }

    async fn explain_plan(&self, request: &ExplainPlanRequest) -> Result<ExplainPlanResponse> {
        self.post_json("ai/explain-plan", request).await
    }

    async fn streak(&self, student_id: &StudentId) -> Result<StreakResponse> {
        self.get_for_student("streak", student_id).await
    }

    async fn progress(
        &self,
        student_id: &StudentId,
        date: Option<NaiveDate>,
    ) -> Result<ProgressResponse> {
        let mut query = vec![("student_id", student_id.as_str().to_string())];
        if let Some(date) = date {
            query.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        let response = self
            .http
            .get(self.endpoint("progress"))
            .query(&query)
            .send()
            .await?;
        decode("progress", response).await
    }

    async fn today_plan(&self, student_id: &StudentId) -> Result<TodayPlanResponse> {
        self.get_for_student("plan/today", student_id).await
    }

    async fn complete_task(&self, task_id: &TaskId, student_id: &StudentId) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint(&format!("task/complete/{}", task_id.0)))
            .query(&[("student_id", student_id.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            debug!(
                task_id = task_id.0,
                status = response.status().as_u16(),
                "task completion answered with failure status"
            );
        }
        Ok(())
    }

    async fn health(&self) -> Result<Value> {
        let response = self.http.get(self.endpoint("health")).send().await?;
        decode("health", response).await
    }
}
