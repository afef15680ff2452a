//! Formatted output helpers for CLI commands.

use berth_api::Task;
use chrono::{DateTime, TimeZone, Utc};

/// Formats an optional timestamp as UTC, or `-` when unset.
#[must_use]
pub fn format_timestamp<Tz: TimeZone>(at: Option<DateTime<Tz>>) -> String {
    at.map_or_else(
        || "-".to_owned(),
        |at| at.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Summarizes a task's containers as `name:known/sent`, comma separated.
///
/// Internal containers are marked with a trailing `*`.
#[must_use]
pub fn container_summary(task: &Task) -> String {
    if task.containers().is_empty() {
        return "-".to_owned();
    }
    task.containers()
        .iter()
        .map(|c| {
            let marker = if c.is_internal() { "*" } else { "" };
            format!(
                "{}{marker}:{}/{}",
                c.name(),
                c.known_status(),
                c.sent_status()
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use berth_api::{Container, ContainerStatus};
    use chrono::FixedOffset;

    use super::*;

    #[test]
    fn format_timestamp_unset_is_dash() {
        assert_eq!(format_timestamp::<Utc>(None), "-");
    }

    #[test]
    fn format_timestamp_converts_to_utc() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let at = offset.with_ymd_and_hms(2024, 5, 1, 11, 30, 0).unwrap();
        assert_eq!(format_timestamp(Some(at)), "2024-05-01 10:30:00");
    }

    #[test]
    fn container_summary_marks_internal_containers() {
        let web = Container::new("web");
        web.set_known_status(ContainerStatus::Running);
        let pause = Container::new("pause").internal();
        let task = Task::new("t1", vec![web, pause]);
        assert_eq!(container_summary(&task), "web:RUNNING/NONE,pause*:NONE/NONE");
    }

    #[test]
    fn container_summary_without_containers() {
        let task = Task::new("t1", Vec::new());
        assert_eq!(container_summary(&task), "-");
    }
}
