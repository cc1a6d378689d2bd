//! Structured JSON-lines logging for simulation runs.
//!
//! One line per event: timestamp, sequence number, level, domain, event
//! name, free-form data object. The sink is chosen once per process from the
//! environment: `LOG_DIR` appends to a per-process file under that directory,
//! `LOG_STDOUT=1` prints, and the default is silent (the engine is a library;
//! callers opt in).

use std::fs::{create_dir_all, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use chrono::Utc;
use serde_json::{json, Map, Value};

// =============================================================================
// Levels and domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Study,   // Input validation, normalisation
    Sampler, // Monte Carlo draws, summaries
    Derived, // Derived metric construction
    Report,  // Assembly, boundary outcomes
    System,  // Startup, configuration
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Study => "study",
            Domain::Sampler => "sampler",
            Domain::Derived => "derived",
            Domain::Report => "report",
            Domain::System => "system",
        }
    }

    /// `LOG_DOMAINS` is a comma-separated allow list; unset or "all" enables
    /// everything.
    pub fn is_enabled(&self) -> bool {
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Sink
// =============================================================================

enum Sink {
    Null,
    Stdout,
    File(Mutex<BufWriter<std::fs::File>>),
}

static SINK: OnceLock<Sink> = OnceLock::new();
static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

/// One file per process under the log directory so concurrent runs never
/// interleave.
fn events_path(dir: &str) -> PathBuf {
    let mut path = PathBuf::from(dir);
    path.push(format!("events-{}.jsonl", std::process::id()));
    path
}

fn sink() -> &'static Sink {
    SINK.get_or_init(|| {
        if let Ok(dir) = std::env::var("LOG_DIR") {
            let path = events_path(&dir);
            let opened = create_dir_all(&dir)
                .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));
            match opened {
                Ok(file) => return Sink::File(Mutex::new(BufWriter::new(file))),
                Err(err) => {
                    eprintln!(
                        "[log] cannot open {}: {}; logging to stdout",
                        path.display(),
                        err
                    );
                    return Sink::Stdout;
                }
            }
        }
        if std::env::var("LOG_STDOUT").as_deref() == Ok("1") {
            Sink::Stdout
        } else {
            Sink::Null
        }
    })
}

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

/// RFC3339 timestamp with milliseconds.
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// =============================================================================
// Emit
// =============================================================================

/// Render one entry as a single JSON line.
fn render(level: Level, domain: Domain, event: &str, data: Map<String, Value>) -> String {
    json!({
        "ts": ts_now(),
        "seq": next_seq(),
        "lvl": level.as_str(),
        "domain": domain.as_str(),
        "event": event,
        "data": Value::Object(data),
    })
    .to_string()
}

fn write_line(writer: &Mutex<BufWriter<std::fs::File>>, line: &str) {
    if let Ok(mut w) = writer.lock() {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

/// Emit a structured log entry, subject to level and domain filters.
pub fn log(level: Level, domain: Domain, event: &str, data: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    let line = render(level, domain, event, data);
    match sink() {
        Sink::Null => {}
        Sink::Stdout => println!("{}", line),
        Sink::File(writer) => write_line(writer, &line),
    }
}

// =============================================================================
// Field helpers
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in pairs {
        map.insert(key.to_string(), value.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn test_seq_increments() {
        let s1 = next_seq();
        let s2 = next_seq();
        assert!(s2 > s1);
    }

    #[test]
    fn test_obj_helper() {
        let m = obj(&[("key", v_str("value")), ("num", v_num(42.0))]);
        assert_eq!(m.get("key").unwrap(), "value");
        assert_eq!(m.get("num").unwrap(), 42.0);
    }

    #[test]
    fn test_render_shape() {
        let line = render(
            Level::Info,
            Domain::Sampler,
            "sampling_done",
            obj(&[("categories", v_num(15.0))]),
        );
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["lvl"], "info");
        assert_eq!(parsed["domain"], "sampler");
        assert_eq!(parsed["event"], "sampling_done");
        assert_eq!(parsed["data"]["categories"], 15.0);
        assert!(parsed["ts"].is_string());
        assert!(parsed["seq"].is_number());
    }

    #[test]
    fn test_events_path_is_per_process() {
        let path = events_path("out/logs");
        assert!(path.starts_with("out/logs"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("events-"));
        assert!(name.ends_with(".jsonl"));
    }

    #[test]
    fn test_file_sink_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("logs");
        let path = events_path(&base.to_string_lossy());
        create_dir_all(&base).unwrap();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap();
        let writer = Mutex::new(BufWriter::new(file));

        write_line(&writer, &render(Level::Warn, Domain::System, "a", Map::new()));
        write_line(&writer, &render(Level::Warn, Domain::System, "b", Map::new()));

        let mut text = String::new();
        std::fs::File::open(&path)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["domain"], "system");
        }
    }
}
