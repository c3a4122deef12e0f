//! Display models for the daily and overall plan views.

use shared::{
    domain::TaskId,
    protocol::{PlanTask, Subject, WeeklyPlan},
};

pub const LOADING_TEXT: &str = "Loading...";
pub const GENERATING_TEXT: &str = "Generating smart plan...";
pub const EMPTY_DAILY_TEXT: &str = "No plan. Upload syllabus or generate new.";
pub const EMPTY_OVERALL_TEXT: &str = "No overall schedule generated yet.";
pub const DAILY_ERROR_TEXT: &str = "Error loading plan.";
pub const DEFAULT_TAG: &str = "Relax";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanView {
    #[default]
    Daily,
    Overall,
}

impl PlanView {
    pub fn title(self) -> &'static str {
        match self {
            Self::Daily => "Today's Plan",
            Self::Overall => "Overall Schedule",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlanPanel {
    #[default]
    Idle,
    Loading(String),
    Items(Vec<PlanItem>),
    Empty(String),
    Error(String),
    Weekly(Vec<WeeklyDayView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    pub task_id: TaskId,
    pub time_range: String,
    pub subject: String,
    pub tag: String,
    pub topic_line: String,
    pub is_break: bool,
    pub completed: bool,
    /// Only incomplete study tasks offer a completion action.
    pub completable: bool,
}

impl From<&PlanTask> for PlanItem {
    fn from(task: &PlanTask) -> Self {
        let is_break = task.is_break();
        let topic_line = match &task.topics {
            Some(topics) => topics.join(", "),
            None => task.details.clone().unwrap_or_default(),
        };
        Self {
            task_id: task.task_id.clone(),
            time_range: format!("{} - {}", task.start_time, task.end_time),
            subject: task.subject.clone(),
            tag: task
                .difficulty
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| DEFAULT_TAG.to_string()),
            topic_line,
            is_break,
            completed: task.completed,
            completable: !task.completed && !is_break,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyDayView {
    pub date: String,
    /// One `time_slot: subject, subject` line per slot.
    pub slots: Vec<String>,
}

pub fn render_daily(tasks: &[PlanTask]) -> PlanPanel {
    if tasks.is_empty() {
        return PlanPanel::Empty(EMPTY_DAILY_TEXT.to_string());
    }
    PlanPanel::Items(tasks.iter().map(PlanItem::from).collect())
}

pub fn render_overall(cache: Option<&WeeklyPlan>) -> PlanPanel {
    let Some(plan) = cache else {
        return PlanPanel::Empty(EMPTY_OVERALL_TEXT.to_string());
    };
    let days = plan
        .days
        .iter()
        .map(|day| WeeklyDayView {
            date: day.date.clone(),
            slots: day
                .schedule
                .iter()
                .map(|slot| {
                    let subjects = slot
                        .activities
                        .iter()
                        .map(|a| a.subject.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{}: {subjects}", slot.time_slot)
                })
                .collect(),
        })
        .collect();
    PlanPanel::Weekly(days)
}

/// Splits a comma-separated subject list, one subject per segment.
///
/// Returns `None` for blank input, which callers treat as a dismissed prompt.
pub fn parse_subject_list(raw: &str) -> Option<Vec<Subject>> {
    if raw.trim().is_empty() {
        return None;
    }
    Some(
        raw.split(',')
            .map(|segment| Subject::with_defaults(segment.trim()))
            .collect(),
    )
}

#[cfg(test)]
#[path = "tests/plan_view_tests.rs"]
mod tests;
