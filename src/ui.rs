//! User-facing state: status line, controls, counters and the object tally.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::tally::{ObjectTally, TallyEntry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Neutral,
    Loading,
    Ready,
    Error,
}

/// Which commands are currently offered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

impl Controls {
    pub fn idle() -> Self {
        Self {
            start_enabled: true,
            stop_enabled: false,
        }
    }

    pub fn running() -> Self {
        Self {
            start_enabled: false,
            stop_enabled: true,
        }
    }
}

pub fn format_object_count(count: usize) -> String {
    format!("Objects: {}", count)
}

pub fn format_fps(fps: u32) -> String {
    format!("FPS: {}", fps)
}

/// Where the controller publishes user-facing state.
pub trait Frontend {
    fn set_status(&mut self, text: &str, kind: StatusKind);
    fn set_controls(&mut self, controls: Controls);
    fn set_object_count(&mut self, text: &str);
    fn set_fps(&mut self, text: &str);
    fn set_tally(&mut self, tally: &ObjectTally);
    /// One-shot notice that needs the user's attention.
    fn alert(&mut self, message: &str);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

impl UiMode {
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        }
    }
}

/// Terminal frontend.
///
/// Pretty mode keeps a single spinner line with the status, counters and tally. Plain
/// mode prints status changes and one summary line per FPS sample to stderr.
pub struct ConsoleFrontend {
    spinner: Option<ProgressBar>,
    status: String,
    object_count: String,
    fps: String,
    tally: String,
}

impl ConsoleFrontend {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        let use_pretty = is_tty
            && match mode {
                UiMode::Pretty | UiMode::Auto => true,
                UiMode::Plain => false,
            };

        let spinner = use_pretty.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner
        });

        Self {
            spinner,
            status: String::new(),
            object_count: format_object_count(0),
            fps: format_fps(0),
            tally: String::new(),
        }
    }

    fn refresh(&self) {
        if let Some(spinner) = &self.spinner {
            let mut line = format!("{} | {} | {}", self.status, self.object_count, self.fps);
            if !self.tally.is_empty() {
                line.push_str(" | ");
                line.push_str(&self.tally);
            }
            spinner.set_message(line);
        }
    }

    fn print(&self, line: &str) {
        match &self.spinner {
            Some(spinner) => spinner.println(line),
            None => eprintln!("{}", line),
        }
    }
}

fn compact_tally(entries: &[TallyEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{} {}", entry.class, entry.summary()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Frontend for ConsoleFrontend {
    fn set_status(&mut self, text: &str, kind: StatusKind) {
        self.status = text.to_string();
        match kind {
            StatusKind::Error => self.print(&format!("!! {}", text)),
            _ if self.spinner.is_none() => self.print(&format!("==> {}", text)),
            _ => {}
        }
        self.refresh();
    }

    fn set_controls(&mut self, controls: Controls) {
        log::debug!(
            "controls: start {}, stop {}",
            if controls.start_enabled { "enabled" } else { "disabled" },
            if controls.stop_enabled { "enabled" } else { "disabled" }
        );
    }

    fn set_object_count(&mut self, text: &str) {
        self.object_count = text.to_string();
        self.refresh();
    }

    fn set_fps(&mut self, text: &str) {
        self.fps = text.to_string();
        if self.spinner.is_none() {
            let mut line = format!("    {} | {}", self.fps, self.object_count);
            if !self.tally.is_empty() {
                line.push_str(" | ");
                line.push_str(&self.tally);
            }
            self.print(&line);
        }
        self.refresh();
    }

    fn set_tally(&mut self, tally: &ObjectTally) {
        self.tally = compact_tally(tally.entries());
        self.refresh();
    }

    fn alert(&mut self, message: &str) {
        self.print(&format!("!! {}", message));
    }
}

impl Drop for ConsoleFrontend {
    fn drop(&mut self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(self.status.clone());
        }
    }
}

/// Everything a frontend has been told, as last shown.
#[derive(Clone, Debug, PartialEq)]
pub struct FrontendState {
    pub status: String,
    pub status_kind: StatusKind,
    pub status_history: Vec<String>,
    pub controls: Controls,
    pub object_count: String,
    pub fps: String,
    pub tally: Vec<TallyEntry>,
    pub alerts: Vec<String>,
}

impl Default for FrontendState {
    fn default() -> Self {
        Self {
            status: String::new(),
            status_kind: StatusKind::Neutral,
            status_history: Vec::new(),
            controls: Controls::idle(),
            object_count: format_object_count(0),
            fps: format_fps(0),
            tally: Vec::new(),
            alerts: Vec::new(),
        }
    }
}

/// In-memory frontend. Clones share state, so a handle can be inspected after the
/// frontend has been handed to a controller.
#[derive(Clone, Debug, Default)]
pub struct MemoryFrontend {
    state: Arc<Mutex<FrontendState>>,
}

impl MemoryFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> FrontendState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, FrontendState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Frontend for MemoryFrontend {
    fn set_status(&mut self, text: &str, kind: StatusKind) {
        let mut state = self.lock();
        state.status = text.to_string();
        state.status_kind = kind;
        state.status_history.push(text.to_string());
    }

    fn set_controls(&mut self, controls: Controls) {
        self.lock().controls = controls;
    }

    fn set_object_count(&mut self, text: &str) {
        self.lock().object_count = text.to_string();
    }

    fn set_fps(&mut self, text: &str) {
        self.lock().fps = text.to_string();
    }

    fn set_tally(&mut self, tally: &ObjectTally) {
        self.lock().tally = tally.entries().to_vec();
    }

    fn alert(&mut self, message: &str) {
        self.lock().alerts.push(message.to_string());
    }
}
