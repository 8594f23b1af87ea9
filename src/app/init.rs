use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::Result;
use log::debug;

use super::{App, Composer, Notice};
use crate::agent::{ChatAgentFactory, ChatInvoker};
use crate::config::Settings;
use crate::locale::Locale;
use crate::session::Session;

impl App {
    /// Creates the application state for one interactive session.
    ///
    /// # Arguments
    ///
    /// * `settings` - Validated environment settings.
    /// * `locale` - Initial response language.
    /// * `scan_root` - Directory the CSV file picker scans.
    pub fn new(settings: Settings, locale: Locale, scan_root: PathBuf) -> Result<Self> {
        let scan_root = scan_root.canonicalize().unwrap_or(scan_root);
        debug!("Initializing App, scanning {}", scan_root.display());

        let notice = if settings.has_api_key() {
            Notice::info("Ctrl+O to choose a CSV file, Ctrl+D for sample data")
        } else {
            Notice::warning("No API Key found: set OPENAI_API_KEY to enable the chatbot")
        };

        Ok(Self {
            should_quit: false,
            factory: ChatAgentFactory::new(&settings),
            invoker: ChatInvoker::new()?,
            settings,
            session: Session::new(locale),
            input: Composer::new(),
            overlay: None,
            notice,
            scan_root,
            chat_scroll: 0,
            pending: VecDeque::new(),
            agent_failure: None,
        })
    }
}
