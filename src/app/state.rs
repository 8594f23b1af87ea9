//! Defines the core state structures for the application.
//!
//! `App` owns the session together with the collaborators it needs (agent
//! factory, invoker, settings) and the purely visual state: the question
//! composer, the active overlay, and the notice shown in the status bar.

use std::collections::VecDeque;
use std::path::PathBuf;

use crate::agent::{ChatAgentFactory, ChatInvoker, TableAgent};
use crate::config::Settings;
use crate::locale::Locale;
use crate::session::Session;

pub const SAMPLE_QUESTIONS: [&str; 5] = [
    "What are the basic statistics?",
    "Show me the first 5 rows",
    "Are there any missing values?",
    "What's the correlation between columns?",
    "Create a summary of the data",
];

/// The main application state.
pub struct App {
    // --- Core State ---
    /// Flag to indicate if the application should quit.
    pub should_quit: bool,
    pub settings: Settings,
    /// Locale, table, agent and transcript for this run.
    pub session: Session<TableAgent>,
    pub(crate) factory: ChatAgentFactory,
    pub(crate) invoker: ChatInvoker,

    // --- UI State ---
    /// The question being typed.
    pub input: Composer,
    /// The currently active overlay, if any.
    pub overlay: Option<OverlayState>,
    /// The message shown in the status bar.
    pub notice: Notice,
    /// Directory the file picker scans.
    pub scan_root: PathBuf,
    /// Lines the conversation view is scrolled up from the bottom.
    pub chat_scroll: u16,

    // --- Dispatch ---
    /// User actions waiting for the next loop iteration.
    pub(crate) pending: VecDeque<Action>,
    /// Set when building the agent failed for the current table and locale.
    /// Cleared by anything that changes either.
    pub agent_failure: Option<String>,
}

/// One user intent. Each maps to a single session operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectLanguage(Locale),
    LoadFile(PathBuf),
    LoadSample,
    ClearFile,
    ClearChat,
    /// Build the agent for a freshly loaded table or language.
    PrepareAgent,
    Ask(String),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, text)
    }

    fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Single-line input with cursor and submission history.
#[derive(Clone, Default)]
pub struct Composer {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Inserts a character at the cursor. Newlines are ignored.
    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            return;
        }
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.history_index = None;
    }

    pub fn backspace(&mut self) {
        if let Some((idx, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.buffer.drain(idx..self.cursor);
            self.cursor = idx;
            self.history_index = None;
        }
    }

    pub fn delete(&mut self) {
        if let Some(ch) = self.buffer[self.cursor..].chars().next() {
            self.buffer.drain(self.cursor..self.cursor + ch.len_utf8());
            self.history_index = None;
        }
    }

    pub fn move_left(&mut self) {
        if let Some((idx, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.buffer[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.history_index = None;
    }

    /// Returns the trimmed content, records it in history and empties the
    /// buffer. Blank input yields `None` and is not recorded.
    pub fn take(&mut self) -> Option<String> {
        let content = std::mem::take(&mut self.buffer);
        self.cursor = 0;
        self.history_index = None;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.history.push(trimmed.to_string());
        Some(trimmed.to_string())
    }

    pub fn history_previous(&mut self) -> bool {
        if self.history.is_empty() {
            return false;
        }
        let target = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.load_history(target)
    }

    pub fn history_next(&mut self) -> bool {
        match self.history_index {
            Some(idx) if idx + 1 < self.history.len() => self.load_history(idx + 1),
            Some(_) => {
                self.history_index = None;
                self.buffer.clear();
                self.cursor = 0;
                true
            }
            None => false,
        }
    }

    fn load_history(&mut self, index: usize) -> bool {
        if let Some(entry) = self.history.get(index).cloned() {
            self.buffer = entry;
            self.cursor = self.buffer.len();
            self.history_index = Some(index);
            true
        } else {
            false
        }
    }

    /// Display column of the cursor, counting wide characters as two.
    pub fn cursor_column(&self) -> u16 {
        let width: usize = self.buffer[..self.cursor]
            .chars()
            .map(|ch| unicode_width::UnicodeWidthChar::width(ch).unwrap_or(1))
            .sum();
        width.min(u16::MAX as usize) as u16
    }
}

/// A list overlay with a clamped selection.
#[derive(Debug, Clone)]
pub struct ListPicker<T> {
    pub items: Vec<T>,
    pub selected: usize,
}

impl<T> ListPicker<T> {
    pub fn new(items: Vec<T>, selected: usize) -> Self {
        let selected = selected.min(items.len().saturating_sub(1));
        Self { items, selected }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.items.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.items.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }
}

/// Temporary panels drawn over the main interface.
#[derive(Debug, Clone)]
pub enum OverlayState {
    Language(ListPicker<Locale>),
    Files(ListPicker<PathBuf>),
    SampleQuestions(ListPicker<&'static str>),
}
