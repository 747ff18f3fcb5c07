#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_fleetctl") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) {
        "fleetctl.exe"
    } else {
        "fleetctl"
    };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve fleetctl binary path for integration test"),
    }
}

/// Run `fleetctl` with the activity log pointed into `workdir` and JSON
/// output forced off unless `--json` is passed.
pub fn run_cli_case(case_name: &str, workdir: &Path, args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("fleetdesk-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let output = Command::new(&bin_path)
        .args(args)
        .env("FLEET_OUTPUT_FORMAT", "human")
        .env("FLEET_LOGGING_JSONL_PATH", workdir.join("activity.jsonl"))
        .env("HOME", workdir)
        .env("RUST_BACKTRACE", "1")
        .output()
        .expect("execute fleetctl command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

pub const VEHICLES_JSON: &str = r#"[
  {"id": 1, "brand": "Toyota", "model": "Hilux", "year": 2021, "plate": "ABC-123",
   "vin": "1HGCM82633A004352", "status": "available", "created_at": "2024-01-10T08:00:00Z"},
  {"id": 2, "brand": "Nissan", "model": "NP300", "year": 2019, "plate": "XYZ-987",
   "status": "maintenance", "mileage_km": 88000, "created_at": "2024-05-12T08:30:00Z"},
  {"id": 3, "brand": "Toyota", "model": "Corolla", "year": 2023, "plate": "JKL-456",
   "color": "Blanco", "status": "assigned", "customer_id": 11,
   "created_at": "2024-03-02T12:00:00Z"},
  {"id": 4, "brand": "Ford", "model": "Transit", "plate": "MNO-321",
   "status": "available", "created_at": "2023-11-20T16:45:00Z"}
]"#;

pub const CUSTOMERS_JSON: &str = r#"[
  {"id": 11, "kind": "individual", "display_name": "Ángel Ruiz Soto",
   "email": "angel@example.com", "city": "Monterrey", "created_at": "2024-02-01T09:00:00Z"},
  {"id": 12, "kind": "business", "display_name": "Transportes Lupita SA",
   "email": "ops@lupita.mx", "tax_id": "TLU940312AB1", "created_at": "2024-04-15T10:00:00Z"},
  {"id": 13, "kind": "endorser", "display_name": "alicia Gómez", "active": false,
   "created_at": "2023-12-24T18:00:00Z"}
]"#;
