//! Append-only JSONL activity log.
//!
//! One self-contained JSON object per line, assembled in memory and written
//! with a single `write_all` so a tailing reader never sees a partial line.
//! When the primary file cannot be written the writer steps down to the
//! fallback file, then stderr, then drops lines; logging never fails the
//! caller.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::core::config::LoggingConfig;
use crate::core::errors::{FleetError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    WizardAdvance,
    WizardBlocked,
    WizardBack,
    DiscriminantChange,
    DraftReset,
    SubmitStart,
    SubmitSuccess,
    SubmitRejected,
    SubmitFailure,
    ListStateChange,
    ConfigLoad,
    LogDropped,
}

/// One JSONL line. Everything but `ts`, `event` and `severity` is optional
/// and omitted when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with milliseconds.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Form or record type (`customer`, `vehicle`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_step: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_step: Option<usize>,
    /// Fields that failed validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            event,
            severity,
            scope: None,
            from_step: None,
            to_step: None,
            fields: None,
            filtered: None,
            duration_ms: None,
            ok: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    #[must_use]
    pub fn scoped(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }
}

/// Where lines currently go.
enum Sink {
    Primary(BufWriter<File>),
    Fallback(BufWriter<File>),
    Stderr,
    Discard,
}

impl Sink {
    const fn label(&self) -> &'static str {
        match self {
            Self::Primary(_) => "primary",
            Self::Fallback(_) => "fallback",
            Self::Stderr => "stderr",
            Self::Discard => "discard",
        }
    }

    fn file(&mut self) -> Option<&mut BufWriter<File>> {
        match self {
            Self::Primary(w) | Self::Fallback(w) => Some(w),
            Self::Stderr | Self::Discard => None,
        }
    }
}

/// Writer settings.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    /// Rotate once the current file would exceed this many bytes.
    pub max_size_bytes: u64,
    /// Rotated generations kept as `<path>.1` … `<path>.N`.
    pub max_rotated_files: u32,
    pub fsync_interval_secs: u64,
}

impl From<&LoggingConfig> for JsonlConfig {
    fn from(cfg: &LoggingConfig) -> Self {
        Self {
            path: cfg.jsonl_path.clone(),
            fallback_path: cfg.fallback_path.clone(),
            max_size_bytes: cfg.max_size_bytes,
            max_rotated_files: cfg.max_rotated_files,
            fsync_interval_secs: cfg.fsync_interval_secs,
        }
    }
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self::from(&LoggingConfig::default())
    }
}

/// JSONL writer with size rotation and a degradation chain.
pub struct JsonlWriter {
    config: JsonlConfig,
    sink: Sink,
    bytes_written: u64,
    last_fsync: Instant,
}

impl JsonlWriter {
    /// Open the primary file, stepping down the chain if that fails.
    pub fn open(config: JsonlConfig) -> Self {
        let mut writer = Self {
            config,
            sink: Sink::Discard,
            bytes_written: 0,
            last_fsync: Instant::now(),
        };
        match open_append(&writer.config.path) {
            Ok((file, size)) => {
                writer.sink = Sink::Primary(BufWriter::new(file));
                writer.bytes_written = size;
            }
            Err(_) => writer.open_fallback(),
        }
        writer
    }

    pub fn write_entry(&mut self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(json) => self.write_line(&format!("{json}\n")),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[FLT-JSONL] serialize error: {e}");
            }
        }
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.sink.file() {
            let _ = w.flush();
        }
    }

    pub fn fsync(&mut self) {
        if let Some(w) = self.sink.file() {
            let _ = w.flush();
            let _ = w.get_ref().sync_data();
        }
        self.last_fsync = Instant::now();
    }

    /// `primary`, `fallback`, `stderr` or `discard`.
    pub fn state(&self) -> &'static str {
        self.sink.label()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Return to the primary file if it has become writable again.
    pub fn try_recover(&mut self) {
        if matches!(self.sink, Sink::Primary(_)) {
            return;
        }
        if let Ok((file, size)) = open_append(&self.config.path) {
            self.flush();
            self.sink = Sink::Primary(BufWriter::new(file));
            self.bytes_written = size;
        }
    }

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if self.bytes_written.saturating_add(len) > self.config.max_size_bytes
            && self.sink.file().is_some()
        {
            self.rotate();
        }

        match &mut self.sink {
            Sink::Primary(w) | Sink::Fallback(w) => {
                if w.write_all(line.as_bytes()).is_ok() {
                    self.bytes_written = self.bytes_written.saturating_add(len);
                    if self.last_fsync.elapsed().as_secs() >= self.config.fsync_interval_secs {
                        self.fsync();
                    }
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            Sink::Stderr => {
                let _ = write!(io::stderr(), "[FLT-JSONL] {line}");
            }
            Sink::Discard => {}
        }
    }

    fn open_fallback(&mut self) {
        let opened = self
            .config
            .fallback_path
            .as_deref()
            .and_then(|fb| open_append(fb).ok().map(|opened| (fb.to_path_buf(), opened)));
        match opened {
            Some((path, (file, size))) => {
                let _ = writeln!(
                    io::stderr(),
                    "[FLT-JSONL] primary path failed, using fallback: {}",
                    path.display()
                );
                self.sink = Sink::Fallback(BufWriter::new(file));
                self.bytes_written = size;
            }
            None => {
                let _ = writeln!(io::stderr(), "[FLT-JSONL] no writable log file, using stderr");
                self.sink = Sink::Stderr;
            }
        }
    }

    fn degrade(&mut self) {
        match self.sink {
            Sink::Primary(_) => self.open_fallback(),
            Sink::Fallback(_) => self.sink = Sink::Stderr,
            Sink::Stderr | Sink::Discard => self.sink = Sink::Discard,
        }
    }

    fn rotate(&mut self) {
        let base = match &self.sink {
            Sink::Primary(_) => self.config.path.clone(),
            Sink::Fallback(_) => match &self.config.fallback_path {
                Some(path) => path.clone(),
                None => return,
            },
            Sink::Stderr | Sink::Discard => return,
        };
        self.flush();
        let was_primary = matches!(self.sink, Sink::Primary(_));
        self.sink = Sink::Discard;

        // <base>.N-1 → <base>.N … <base> → <base>.1; the oldest falls off.
        let keep = self.config.max_rotated_files;
        let _ = fs::remove_file(rotated_name(&base, keep));
        for generation in (1..keep).rev() {
            let _ = fs::rename(
                rotated_name(&base, generation),
                rotated_name(&base, generation + 1),
            );
        }
        if keep > 0 {
            let _ = fs::rename(&base, rotated_name(&base, 1));
        } else {
            let _ = fs::remove_file(&base);
        }

        match open_append(&base) {
            Ok((file, _)) => {
                let writer = BufWriter::new(file);
                self.sink = if was_primary {
                    Sink::Primary(writer)
                } else {
                    Sink::Fallback(writer)
                };
                self.bytes_written = 0;
            }
            Err(_) => {
                if was_primary {
                    self.open_fallback();
                } else {
                    self.sink = Sink::Stderr;
                }
            }
        }
    }
}

/// Open or create `path` for appending. Returns the file and its current size.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| FleetError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| FleetError::io(path, source))?;
    let size = file.metadata().map_or(0, |m| m.len());
    Ok((file, size))
}

/// `activity.jsonl` → `activity.jsonl.3`
fn rotated_name(base: &Path, generation: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}
