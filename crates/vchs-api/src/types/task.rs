use serde::Deserialize;
use strum::EnumString;

use super::Link;

/// `<Tasks>` -- tasks still running against an entity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TasksInProgress {
    #[serde(rename = "Task", default)]
    pub tasks: Vec<Task>,
}

/// A snapshot of a remote asynchronous operation.
///
/// Snapshots are never updated in place: polling replaces the whole value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Task {
    #[serde(rename = "@status", default)]
    pub status: Option<String>,
    #[serde(rename = "@operation", default)]
    pub operation: Option<String>,
    #[serde(rename = "@operationName", default)]
    pub operation_name: Option<String>,
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "Link", default)]
    pub links: Vec<Link>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Error", default)]
    pub error: Option<TaskError>,
    #[serde(rename = "Details", default)]
    pub details: Option<String>,
}

impl Task {
    /// Parsed status; `None` when the server omitted the attribute.
    pub fn task_status(&self) -> Option<TaskStatus> {
        self.status
            .as_deref()
            .and_then(|s| s.parse::<TaskStatus>().ok())
    }

    /// Whether polling can stop. Absent or unrecognised statuses keep the
    /// task running.
    pub fn is_terminal(&self) -> bool {
        self.task_status().is_some_and(|s| s.is_terminal())
    }
}

/// The `<Error>` child of a failed task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskError {
    #[serde(rename = "@message", default)]
    pub message: Option<String>,
    #[serde(rename = "@majorErrorCode", default)]
    pub major_error_code: Option<String>,
    #[serde(rename = "@minorErrorCode", default)]
    pub minor_error_code: Option<String>,
    #[serde(rename = "@stackTrace", default)]
    pub stack_trace: Option<String>,
}

/// vCloud task states. Only `Success` and `Error` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum TaskStatus {
    Queued,
    PreRunning,
    Running,
    Success,
    Error,
    Canceled,
    Aborted,
    #[strum(default)]
    Other(String),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::PreRunning => "preRunning",
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
            Self::Canceled => "canceled",
            Self::Aborted => "aborted",
            Self::Other(s) => s,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::decode;

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!("success".parse::<TaskStatus>().unwrap(), TaskStatus::Success);
        assert_eq!("ERROR".parse::<TaskStatus>().unwrap(), TaskStatus::Error);
        assert_eq!(
            "preRunning".parse::<TaskStatus>().unwrap(),
            TaskStatus::PreRunning
        );
        assert_eq!(
            "mystery".parse::<TaskStatus>().unwrap(),
            TaskStatus::Other("mystery".into())
        );
    }

    #[test]
    fn only_success_and_error_are_terminal() {
        let task = |status: Option<&str>| Task {
            status: status.map(str::to_owned),
            href: "https://vcd/api/task/1".into(),
            ..Task::default()
        };
        assert!(task(Some("success")).is_terminal());
        assert!(task(Some("error")).is_terminal());
        assert!(!task(Some("running")).is_terminal());
        assert!(!task(Some("aborted")).is_terminal());
        assert!(!task(None).is_terminal());
    }

    #[test]
    fn failed_task_carries_error_detail() {
        let task: Task = decode(
            r#"<Task status="error" operation="Updating Virtual Application web-01"
                     operationName="vappUpdateVm" href="https://vcd/api/task/9">
                 <Error message="Network not found" majorErrorCode="400"
                        minorErrorCode="BAD_REQUEST" stackTrace="at x.y"/>
                 <Details>Network not found</Details>
               </Task>"#,
        )
        .unwrap();
        assert_eq!(task.task_status(), Some(TaskStatus::Error));
        let error = task.error.unwrap();
        assert_eq!(error.message.as_deref(), Some("Network not found"));
        assert_eq!(error.minor_error_code.as_deref(), Some("BAD_REQUEST"));
        assert_eq!(task.details.as_deref(), Some("Network not found"));
    }
}
