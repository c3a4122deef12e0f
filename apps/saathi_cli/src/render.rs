//! Terminal rendering of client events.

use client_core::{
    plan_view::{PlanItem, PlanPanel},
    speech::mic_label,
    state::BusyAction,
    ClientEvent, Screen,
};
use serde_json::{json, Value};

/// Combined server and local-storage health, printed by `health`.
pub fn health_report(
    server: client_core::Result<Value>,
    storage: anyhow::Result<()>,
) -> Value {
    let server = match server {
        Ok(status) => status,
        Err(err) => json!({"status": "unreachable", "error": err.to_string()}),
    };
    let storage = match storage {
        Ok(()) => json!({"status": "ok"}),
        Err(err) => json!({"status": "error", "error": format!("{err:#}")}),
    };
    json!({"server": server, "storage": storage})
}

/// Lines to print for one event. Events with no visible effect yield nothing.
pub fn describe(event: &ClientEvent) -> Vec<String> {
    match event {
        ClientEvent::SessionReset => vec!["Logged out.".to_string()],
        ClientEvent::ScreenChanged(Screen::Setup) => {
            vec!["Welcome to Study Saathi. Set up your profile to begin.".to_string()]
        }
        ClientEvent::ScreenChanged(Screen::Dashboard { greeting }) => vec![greeting.clone()],
        ClientEvent::ProfileChanged(_) => Vec::new(),
        ClientEvent::Alert(message) => vec![format!("[!] {message}")],
        ClientEvent::MotivationUpdated(text) => vec![format!("Motivation: {text}")],
        ClientEvent::StreakUpdated(days) => vec![format!("Streak: {days} day(s)")],
        ClientEvent::ProgressUpdated(label) => vec![format!("Progress today: {label}")],
        ClientEvent::PlanViewChanged(view) => vec![format!("== {} ==", view.title())],
        ClientEvent::PlanPanelUpdated(panel) => describe_panel(panel),
        ClientEvent::ExplanationUpdated(text) => vec![format!("Why this plan: {text}")],
        ClientEvent::OverallScheduleCached(plan) => {
            vec![format!("Overall schedule ready ({} days).", plan.days.len())]
        }
        ClientEvent::DoubtAnswerChanged(Some(answer)) => vec![format!("Answer: {answer}")],
        ClientEvent::DoubtAnswerChanged(None) | ClientEvent::DoubtSolved => Vec::new(),
        ClientEvent::BusyChanged { action, busy: true } => vec![match action {
            BusyAction::Syllabus => "Processing syllabus...".to_string(),
            BusyAction::Doubt => "Thinking...".to_string(),
        }],
        ClientEvent::BusyChanged { busy: false, .. } => Vec::new(),
        ClientEvent::TutorSessionStarted => vec!["-- tutor session --".to_string()],
        ClientEvent::TutorTurnApplied { .. } => Vec::new(),
        ClientEvent::TranscriptAppended(entry) => vec![entry.to_string()],
        ClientEvent::MicrophoneChanged { enabled, listening } => {
            if *enabled {
                vec![format!("[{}]", mic_label(*listening))]
            } else {
                Vec::new()
            }
        }
    }
}

fn describe_panel(panel: &PlanPanel) -> Vec<String> {
    match panel {
        PlanPanel::Idle => Vec::new(),
        PlanPanel::Loading(text) | PlanPanel::Empty(text) | PlanPanel::Error(text) => {
            vec![text.clone()]
        }
        PlanPanel::Items(items) => items.iter().map(describe_item).collect(),
        PlanPanel::Weekly(days) => days
            .iter()
            .flat_map(|day| {
                std::iter::once(day.date.clone())
                    .chain(day.slots.iter().map(|slot| format!("  {slot}")))
            })
            .collect(),
    }
}

fn describe_item(item: &PlanItem) -> String {
    let marker = if item.completed {
        "[x]"
    } else if item.is_break {
        "[~]"
    } else {
        "[ ]"
    };
    let mut line = format!(
        "{marker} {} {} ({})",
        item.time_range, item.subject, item.tag
    );
    if !item.topic_line.is_empty() {
        line.push_str(&format!(" - {}", item.topic_line));
    }
    if item.completable {
        line.push_str(&format!("  #{}", item.task_id));
    }
    line
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
