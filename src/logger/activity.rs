//! Activity logger thread.
//!
//! A dedicated thread owns the [`JsonlWriter`]. Wizards and list screens hold a
//! cloneable [`ActivityLoggerHandle`] and push [`ActivityEvent`]s through a
//! bounded crossbeam channel with `try_send`, so UI-side code never blocks on
//! disk IO.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::core::config::LoggingConfig;
use crate::core::errors::{FleetError, Result};
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// Something worth a line in the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    StepAdvanced {
        form: &'static str,
        from: usize,
        to: usize,
    },
    StepBlocked {
        form: &'static str,
        step: usize,
        reason: String,
        fields: Vec<String>,
    },
    StepBack {
        form: &'static str,
        from: usize,
        to: usize,
    },
    DiscriminantChanged {
        form: &'static str,
        from: Option<String>,
        to: String,
    },
    DraftReset {
        form: &'static str,
    },
    SubmitStarted {
        form: &'static str,
    },
    SubmitSucceeded {
        form: &'static str,
        duration_ms: u64,
    },
    SubmitRejected {
        form: &'static str,
        reason: String,
        fields: Vec<String>,
    },
    SubmitFailed {
        form: &'static str,
        message: String,
        duration_ms: u64,
    },
    ListStateChanged {
        record: &'static str,
        filter: String,
        sort: String,
        page_index: usize,
        page_size: usize,
        filtered: usize,
    },
    ConfigLoaded {
        config_hash: String,
    },
    /// Ask the logger thread to flush and exit.
    Shutdown,
}

/// Cloneable sender side of the activity log.
#[derive(Debug, Clone)]
pub struct ActivityLoggerHandle {
    tx: Sender<ActivityEvent>,
    dropped_events: Arc<AtomicU64>,
}

impl ActivityLoggerHandle {
    /// Queue an event without blocking. A full channel drops the event and
    /// bumps the dropped counter.
    pub fn send(&self, event: ActivityEvent) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Request a flush-and-exit. Blocks only if the channel is full.
    pub fn shutdown(&self) -> Result<()> {
        self.tx
            .send(ActivityEvent::Shutdown)
            .map_err(|_| FleetError::ChannelClosed {
                component: "activity-logger",
            })
    }

}

/// Options for the logger thread.
#[derive(Debug, Clone)]
pub struct ActivityLoggerConfig {
    pub jsonl: JsonlConfig,
    pub channel_capacity: usize,
}

impl From<&LoggingConfig> for ActivityLoggerConfig {
    fn from(cfg: &LoggingConfig) -> Self {
        Self {
            jsonl: JsonlConfig::from(cfg),
            channel_capacity: cfg.channel_capacity,
        }
    }
}

/// Spawn the logger thread.
///
/// The thread exits after [`ActivityLoggerHandle::shutdown`] or once every
/// handle has been dropped.
pub fn spawn_logger(
    config: ActivityLoggerConfig,
) -> Result<(ActivityLoggerHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded::<ActivityEvent>(config.channel_capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    let handle = ActivityLoggerHandle {
        tx,
        dropped_events: Arc::clone(&dropped),
    };

    let jsonl = config.jsonl;
    let join = thread::Builder::new()
        .name("fleetdesk-logger".to_string())
        .spawn(move || logger_thread_main(&rx, jsonl, &dropped))
        .map_err(|e| FleetError::Runtime {
            details: format!("failed to spawn logger thread: {e}"),
        })?;

    Ok((handle, join))
}

/// Events between attempts to return to the primary file while degraded.
const RECOVER_EVERY: u64 = 64;

fn logger_thread_main(rx: &Receiver<ActivityEvent>, jsonl: JsonlConfig, dropped: &AtomicU64) {
    let mut writer = JsonlWriter::open(jsonl);
    let mut written: u64 = 0;

    while let Ok(event) = rx.recv() {
        let lost = dropped.swap(0, Ordering::Relaxed);
        if lost > 0 {
            let mut warn = LogEntry::new(EventType::LogDropped, Severity::Warning);
            warn.details = Some(format!("{lost} activity events dropped under back-pressure"));
            writer.write_entry(&warn);
        }

        if event == ActivityEvent::Shutdown {
            break;
        }
        writer.write_entry(&to_log_entry(&event));

        written = written.wrapping_add(1);
        if written % RECOVER_EVERY == 0 && writer.state() != "primary" {
            writer.try_recover();
        }
    }

    writer.fsync();
}

fn names(fields: &[String]) -> Option<Vec<String>> {
    (!fields.is_empty()).then(|| fields.to_vec())
}

fn to_log_entry(event: &ActivityEvent) -> LogEntry {
    match event {
        ActivityEvent::StepAdvanced { form, from, to } => {
            let mut e = LogEntry::new(EventType::WizardAdvance, Severity::Info).scoped(form);
            e.from_step = Some(*from);
            e.to_step = Some(*to);
            e
        }
        ActivityEvent::StepBlocked {
            form,
            step,
            reason,
            fields,
        } => {
            let mut e = LogEntry::new(EventType::WizardBlocked, Severity::Info).scoped(form);
            e.from_step = Some(*step);
            e.fields = names(fields);
            e.details = Some(reason.clone());
            e
        }
        ActivityEvent::StepBack { form, from, to } => {
            let mut e = LogEntry::new(EventType::WizardBack, Severity::Info).scoped(form);
            e.from_step = Some(*from);
            e.to_step = Some(*to);
            e
        }
        ActivityEvent::DiscriminantChanged { form, from, to } => {
            let mut e = LogEntry::new(EventType::DiscriminantChange, Severity::Info).scoped(form);
            e.details = Some(format!(
                "{}->{to}",
                from.as_deref().unwrap_or("none")
            ));
            e
        }
        ActivityEvent::DraftReset { form } => {
            LogEntry::new(EventType::DraftReset, Severity::Info).scoped(form)
        }
        ActivityEvent::SubmitStarted { form } => {
            LogEntry::new(EventType::SubmitStart, Severity::Info).scoped(form)
        }
        ActivityEvent::SubmitSucceeded { form, duration_ms } => {
            let mut e = LogEntry::new(EventType::SubmitSuccess, Severity::Info).scoped(form);
            e.duration_ms = Some(*duration_ms);
            e.ok = Some(true);
            e
        }
        ActivityEvent::SubmitRejected {
            form,
            reason,
            fields,
        } => {
            let mut e = LogEntry::new(EventType::SubmitRejected, Severity::Info).scoped(form);
            e.ok = Some(false);
            e.fields = names(fields);
            e.details = Some(reason.clone());
            e
        }
        ActivityEvent::SubmitFailed {
            form,
            message,
            duration_ms,
        } => {
            let mut e = LogEntry::new(EventType::SubmitFailure, Severity::Warning).scoped(form);
            e.ok = Some(false);
            e.error_message = Some(message.clone());
            e.duration_ms = Some(*duration_ms);
            e
        }
        ActivityEvent::ListStateChanged {
            record,
            filter,
            sort,
            page_index,
            page_size,
            filtered,
        } => {
            let mut e = LogEntry::new(EventType::ListStateChange, Severity::Info).scoped(record);
            e.filtered = Some(*filtered);
            e.details = Some(format!(
                "filter={filter} sort={sort} page={page_index} size={page_size}"
            ));
            e
        }
        ActivityEvent::ConfigLoaded { config_hash } => {
            let mut e = LogEntry::new(EventType::ConfigLoad, Severity::Info);
            e.details = Some(format!("config_hash={config_hash}"));
            e.ok = Some(true);
            e
        }
        ActivityEvent::Shutdown => LogEntry::new(EventType::LogDropped, Severity::Info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &std::path::Path, capacity: usize) -> ActivityLoggerConfig {
        ActivityLoggerConfig {
            jsonl: JsonlConfig {
                path: dir.join("activity.jsonl"),
                fallback_path: None,
                max_size_bytes: 10 * 1024 * 1024,
                max_rotated_files: 3,
                fsync_interval_secs: 60,
            },
            channel_capacity: capacity,
        }
    }

    #[test]
    fn events_reach_the_file_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, join) = spawn_logger(test_config(dir.path(), 64)).unwrap();
        handle.send(ActivityEvent::StepAdvanced {
            form: "customer",
            from: 0,
            to: 1,
        });
        handle.send(ActivityEvent::SubmitFailed {
            form: "customer",
            message: "503 Service Unavailable".to_string(),
            duration_ms: 12,
        });
        handle.shutdown().unwrap();
        join.join().unwrap();

        let contents = std::fs::read_to_string(dir.path().join("activity.jsonl")).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "wizard_advance");
        assert_eq!(lines[1]["event"], "submit_failure");
        assert_eq!(lines[1]["severity"], "warning");
        assert_eq!(lines[1]["error_message"], "503 Service Unavailable");
    }

    #[test]
    fn clones_share_the_channel() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, join) = spawn_logger(test_config(dir.path(), 64)).unwrap();
        let other = handle.clone();
        handle.send(ActivityEvent::DraftReset { form: "vehicle" });
        other.send(ActivityEvent::ListStateChanged {
            record: "vehicle",
            filter: "{}".to_string(),
            sort: "created_at:desc".to_string(),
            page_index: 0,
            page_size: 10,
            filtered: 12,
        });
        handle.shutdown().unwrap();
        join.join().unwrap();

        let contents = std::fs::read_to_string(dir.path().join("activity.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("created_at:desc"));
    }

    #[test]
    fn thread_exits_when_handles_drop() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, join) = spawn_logger(test_config(dir.path(), 4)).unwrap();
        handle.send(ActivityEvent::SubmitStarted { form: "vehicle" });
        drop(handle);
        join.join().unwrap();
        let contents = std::fs::read_to_string(dir.path().join("activity.jsonl")).unwrap();
        assert!(contents.contains("submit_start"));
    }

    #[test]
    fn blocked_entry_lists_fields() {
        let entry = to_log_entry(&ActivityEvent::StepBlocked {
            form: "vehicle",
            step: 1,
            reason: "invalid".to_string(),
            fields: vec!["vin".to_string()],
        });
        assert_eq!(entry.fields, Some(vec!["vin".to_string()]));
        assert_eq!(entry.from_step, Some(1));
        assert_eq!(entry.scope.as_deref(), Some("vehicle"));
    }
}
