//! Append-only JSON-lines records of benchmark invocations: what ran, where,
//! against which dependency versions, and what it measured.

use std::collections::BTreeMap;
use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use json::JsonValue;

/// Environment prefixes worth keeping with a benchmark result.
const ENV_PREFIXES: [&str; 2] = ["SSSP", "SLURM"];
/// Dependencies whose locked versions go into the record.
const TRACKED_PACKAGES: [&str; 4] = ["clap", "parking_lot", "rand", "core_affinity"];

/// One benchmark invocation: context captured at construction plus whatever
/// outputs the driver reports before writing.
pub struct RunRecord {
    name: String,
    started: String,
    command: Vec<String>,
    outputs: BTreeMap<String, String>,
}

impl RunRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            started: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            command: env::args().collect(),
            outputs: BTreeMap::new(),
        }
    }

    /// Record named after the running executable's file stem.
    pub fn for_current_exe() -> Self {
        let name = env::current_exe()
            .ok()
            .and_then(|path| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "benchmark".to_string());
        Self::new(&name)
    }

    pub fn add_output(&mut self, key: &str, value: impl ToString) {
        self.outputs.insert(key.to_string(), value.to_string());
    }

    pub fn to_json(&self) -> JsonValue {
        let mut outputs = JsonValue::new_object();
        for (key, value) in &self.outputs {
            outputs[key.as_str()] = value.as_str().into();
        }
        json::object! {
            "name" => self.name.clone(),
            "started" => self.started.clone(),
            "command" => self.command.clone(),
            "outputs" => outputs,
            "git" => git_revision(),
            "host" => host_info(),
            "environment" => env_matching(env::vars()),
            "dependencies" => locked_versions(),
        }
    }

    /// Appends the record as a single line, keeping whatever `path` held.
    pub fn append_to(&self, path: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", json::stringify(self.to_json()))
    }

    /// `<name>_<timestamp>.jsonl` under `root`, for callers without a path.
    pub fn default_path(&self, root: &Path) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        root.join(format!("{}_{stamp}.jsonl", self.name))
    }
}

/// Head commit of the working tree, when git answers.
fn git_revision() -> JsonValue {
    const QUERIES: [(&str, &[&str]); 2] = [
        ("commit", &["rev-parse", "HEAD"]),
        ("commit_date", &["log", "-1", "--format=%cI"]),
    ];
    let mut revision = JsonValue::new_object();
    for (key, args) in QUERIES {
        if let Some(value) = git_output(args) {
            revision[key] = value.into();
        }
    }
    revision
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn host_info() -> JsonValue {
    let sys = sysinfo::System::new_all();
    let mut host = json::object! {
        "cpu_cores" => sys.cpus().len(),
        "ram_bytes" => sys.total_memory(),
    };
    if let Some(hostname) = sysinfo::System::host_name() {
        host["hostname"] = hostname.into();
    }
    if let Some(os) = sysinfo::System::long_os_version() {
        host["os"] = os.into();
    }
    if let Some(cpu) = sys.cpus().first() {
        host["cpu_brand"] = cpu.brand().into();
    }
    host
}

fn env_matching(vars: impl Iterator<Item = (String, String)>) -> JsonValue {
    let mut captured = JsonValue::new_object();
    for (key, value) in vars {
        if ENV_PREFIXES.iter().any(|prefix| key.starts_with(prefix)) {
            captured[key.as_str()] = value.into();
        }
    }
    captured
}

/// Locked versions of the tracked dependencies. The lockfile sits next to the
/// member manifest in a plain crate and one level up in a workspace.
fn locked_versions() -> JsonValue {
    let mut versions = JsonValue::new_object();
    let Some(lock) = read_lockfile() else {
        return versions;
    };
    for block in lock.split("[[package]]").skip(1) {
        if let (Some(name), Some(version)) = (field(block, "name"), field(block, "version")) {
            if TRACKED_PACKAGES.contains(&name.as_str()) {
                versions[name.as_str()] = version.into();
            }
        }
    }
    versions
}

fn read_lockfile() -> Option<String> {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let dir = PathBuf::from(manifest_dir);
    [dir.join("Cargo.lock"), dir.join("../Cargo.lock")]
        .iter()
        .find_map(|path| std::fs::read_to_string(path).ok())
}

/// Value of a `key = "value"` line inside a lockfile package block.
fn field(block: &str, key: &str) -> Option<String> {
    for line in block.lines() {
        if let Some(rest) = line.trim_start().strip_prefix(key) {
            if let Some(value) = rest.trim_start().strip_prefix('=') {
                return Some(value.trim().trim_matches('"').to_string());
            }
        }
    }
    None
}
