use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use hotframe_kernel::frame::{
    ActionHook, CacheHandler, Frame, Template, TemplateError, TemplateParams, TemplateResult,
};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::frame::EventLog;

/// Template that writes its parameters as sorted `key=value` lines.
///
/// String values are written without quotes.
#[derive(Debug, Default)]
pub struct EchoTemplate {
    calls: AtomicUsize,
}

impl EchoTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Template for EchoTemplate {
    fn process(&self, params: &TemplateParams, out: &mut dyn Write) -> TemplateResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();
        for key in keys {
            match &params[key] {
                Value::String(s) => writeln!(out, "{}={}", key, s)?,
                other => writeln!(out, "{}={}", key, other)?,
            }
        }
        Ok(())
    }
}

/// Template that always fails.
#[derive(Debug)]
pub struct FailingTemplate {
    message: String,
}

impl FailingTemplate {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl Template for FailingTemplate {
    fn process(&self, _params: &TemplateParams, _out: &mut dyn Write) -> TemplateResult<()> {
        Err(TemplateError::Other(self.message.clone()))
    }
}

/// Cache with a fixed intercept answer that records every call.
#[derive(Debug, Default)]
pub struct ScriptedCache {
    hit: Option<String>,
    intercepts: AtomicUsize,
    stored: Mutex<Vec<(String, String)>>,
    log: Option<EventLog>,
}

impl ScriptedCache {
    /// A cache that never has an entry.
    pub fn miss() -> Self {
        Self::default()
    }

    /// A cache that answers every intercept with `rendered`.
    pub fn hit(rendered: &str) -> Self {
        Self {
            hit: Some(rendered.to_string()),
            ..Self::default()
        }
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn intercept_count(&self) -> usize {
        self.intercepts.load(Ordering::SeqCst)
    }

    /// `(frame name, rendered output)` pairs handed to postprocess.
    pub fn stored(&self) -> Vec<(String, String)> {
        self.stored.lock().clone()
    }
}

impl CacheHandler for ScriptedCache {
    fn intercept(&self, frame: &dyn Frame) -> Option<String> {
        self.intercepts.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.push("intercept");
        }
        self.hit.clone()
    }

    fn postprocess(&self, frame: &dyn Frame, rendered: &str) {
        debug!("Storing {} bytes for frame {}", rendered.len(), frame.frame_name());
        if let Some(log) = &self.log {
            log.push("postprocess");
        }
        self.stored
            .lock()
            .push((frame.frame_name().to_string(), rendered.to_string()));
    }
}

/// Hook that records `before:<frame>` and `after:<frame>`.
#[derive(Debug, Clone)]
pub struct RecordingHook {
    log: EventLog,
}

impl RecordingHook {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl ActionHook for RecordingHook {
    fn before_action(&self, frame: &dyn Frame) {
        self.log.push(format!("before:{}", frame.frame_name()));
    }

    fn after_action(&self, frame: &dyn Frame) {
        self.log.push(format!("after:{}", frame.frame_name()));
    }
}

/// Output sink whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingSink;

impl Write for FailingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }
}
