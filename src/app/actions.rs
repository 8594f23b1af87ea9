use std::path::Path;

use log::{debug, info, warn};

use super::{Action, App, Notice};
use crate::locale::Locale;
use crate::session::{AskOutcome, LoadOutcome, SessionState};
use crate::upload;

impl App {
    /// Queues an action for the next loop iteration, after the UI has been
    /// redrawn.
    pub fn queue(&mut self, action: Action) {
        self.pending.push_back(action);
    }

    /// The next action to run: queued user actions first, then building
    /// the agent when a table is loaded and nothing has failed yet.
    pub fn next_action(&mut self) -> Option<Action> {
        if let Some(action) = self.pending.pop_front() {
            return Some(action);
        }
        self.should_prepare_agent().then_some(Action::PrepareAgent)
    }

    /// True while a question is queued but not yet answered.
    pub fn is_thinking(&self) -> bool {
        self.pending
            .iter()
            .any(|action| matches!(action, Action::Ask(_)))
    }

    fn should_prepare_agent(&self) -> bool {
        self.settings.has_api_key()
            && self.agent_failure.is_none()
            && self.session.state() == SessionState::Loaded
    }

    /// Shows the working indicator and queues the question.
    pub(crate) fn submit_question(&mut self, question: String) {
        if !self.settings.has_api_key() {
            self.notice = Notice::warning("Add your OpenAI API key to use the chatbot");
            return;
        }
        if self.session.table().is_none() {
            self.notice = Notice::info("Upload a CSV file to get started");
            return;
        }
        self.notice = Notice::info("Thinking...");
        self.queue(Action::Ask(question));
    }

    /// The single place a queued action touches the session.
    pub async fn dispatch(&mut self, action: Action) {
        debug!("Dispatching {:?}", action);
        match action {
            Action::SelectLanguage(locale) => self.select_language(locale),
            Action::LoadFile(path) => self.load_file(&path),
            Action::LoadSample => self.load_sample(),
            Action::ClearFile => self.clear_file(),
            Action::ClearChat => self.clear_chat(),
            Action::PrepareAgent => self.prepare_agent().await,
            Action::Ask(question) => self.ask(&question).await,
            Action::Quit => self.should_quit = true,
        }
    }

    fn select_language(&mut self, locale: Locale) {
        let before = self.session.locale();
        match self.session.set_locale(locale.name()) {
            Ok(()) if before != locale => {
                self.agent_failure = None;
                self.notice = Notice::info(format!("Responses will be in {}", locale));
            }
            Ok(()) => self.notice = Notice::info(format!("Already responding in {}", locale)),
            Err(err) => self.notice = Notice::error(err.to_string()),
        }
    }

    fn load_file(&mut self, path: &Path) {
        let upload = match upload::read_upload(path, self.settings.max_upload_bytes()) {
            Ok(upload) => upload,
            Err(err) => {
                warn!("Upload rejected: {}", err);
                self.notice = Notice::error(format!("Error loading file: {}", err));
                return;
            }
        };
        match self.session.load_table(&upload.name, &upload.bytes) {
            Ok(LoadOutcome::Loaded) => {
                self.after_table_change();
                let (rows, columns) = self
                    .session
                    .table()
                    .map(|table| (table.row_count(), table.column_count()))
                    .unwrap_or_default();
                self.notice = Notice::success(format!(
                    "Loaded new file: {} ({} rows and {} columns)",
                    upload.name, rows, columns
                ));
            }
            Ok(LoadOutcome::Unchanged) => {
                self.notice = Notice::info(format!("{} is already loaded", upload.name));
            }
            Err(err) => self.notice = Notice::error(format!("Error loading file: {}", err)),
        }
    }

    fn load_sample(&mut self) {
        self.session.load_sample(&mut rand::thread_rng());
        self.after_table_change();
        self.notice = Notice::success("Loaded sample data");
    }

    fn clear_file(&mut self) {
        if self.session.table().is_none() {
            self.notice = Notice::info("No file to clear");
            return;
        }
        self.session.clear_table();
        self.after_table_change();
        self.notice = Notice::info("File cleared");
    }

    fn clear_chat(&mut self) {
        self.session.clear_transcript();
        self.chat_scroll = 0;
        self.notice = Notice::info("Chat history cleared");
    }

    async fn prepare_agent(&mut self) {
        let locale = self.session.locale();
        match self.session.ensure_agent(&self.factory).await {
            Ok(_) => {
                info!("Agent ready for {}", locale);
                self.notice = Notice::success(format!("Agent ready! Will respond in {}", locale));
            }
            Err(err) => {
                self.notice = Notice::error(format!("Error creating agent: {}", err));
                self.agent_failure = Some(err.to_string());
            }
        }
    }

    /// Building the agent here is the user's explicit retry after a failed
    /// construction.
    async fn ask(&mut self, question: &str) {
        if self.session.table().is_none() {
            self.notice = Notice::info("Upload a CSV file to get started");
            return;
        }
        if let Err(err) = self.session.ensure_agent(&self.factory).await {
            self.notice = Notice::error(format!("Error creating agent: {}", err));
            self.agent_failure = Some(err.to_string());
            return;
        }
        self.agent_failure = None;
        self.chat_scroll = 0;
        self.notice = match self.session.ask(question, &self.invoker).await {
            Ok(AskOutcome::Answered) => Notice::success("Answer received"),
            Ok(AskOutcome::Failed) => Notice::error("The question failed; see the conversation"),
            Err(err) => Notice::error(err.to_string()),
        };
    }

    fn after_table_change(&mut self) {
        self.agent_failure = None;
        self.chat_scroll = 0;
    }
}
