//! Session state and the rules that keep its derived parts coherent.
//!
//! A `Session` owns the selected locale, the loaded table, the agent built
//! for that table, and the conversation transcript. Every mutation goes
//! through one of the methods below so that a change of table or locale can
//! never leave a stale agent behind.

use std::sync::Arc;

use log::{debug, info, warn};
use rand::Rng;
use thiserror::Error;

use crate::agent::{AgentFactory, Invoker};
use crate::locale::Locale;
use crate::table::{SAMPLE_SOURCE_NAME, Table, TableParseError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unsupported language: {0}")]
    InvalidLocale(String),
    #[error("could not load {name}: {source}")]
    TableParse {
        name: String,
        #[source]
        source: TableParseError,
    },
    #[error("no data file is loaded")]
    NoTableLoaded,
    #[error("could not create agent: {0}")]
    AgentConstruction(String),
    #[error("the agent is not ready")]
    NoAgent,
}

/// Who wrote a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Ordered user/assistant message log. Append-only from the outside; only
/// the owning session can clear it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker,
            text: text.into(),
        });
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Readiness of the session to answer questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No table loaded.
    Empty,
    /// A table is loaded but no agent is bound to it.
    Loaded,
    /// An agent is bound to the current table and locale.
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// The source name matched the current one; nothing was parsed.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutcome {
    Answered,
    /// The invoker failed; the failure was recorded as an assistant entry.
    Failed,
}

#[derive(Debug)]
struct LoadedTable {
    name: String,
    table: Arc<Table>,
}

pub struct Session<A> {
    locale: Locale,
    loaded: Option<LoadedTable>,
    agent: Option<A>,
    transcript: Transcript,
}

impl<A> Default for Session<A> {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl<A> Session<A> {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            loaded: None,
            agent: None,
            transcript: Transcript::default(),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn table(&self) -> Option<&Arc<Table>> {
        self.loaded.as_ref().map(|loaded| &loaded.table)
    }

    pub fn source_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|loaded| loaded.name.as_str())
    }

    pub fn agent(&self) -> Option<&A> {
        self.agent.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> SessionState {
        match (&self.loaded, &self.agent) {
            (None, _) => SessionState::Empty,
            (Some(_), None) => SessionState::Loaded,
            (Some(_), Some(_)) => SessionState::Ready,
        }
    }

    /// Switches the response language. A different locale drops the agent;
    /// the table and transcript stay.
    pub fn set_locale(&mut self, name: &str) -> Result<(), SessionError> {
        let locale: Locale = name
            .parse()
            .map_err(|_| SessionError::InvalidLocale(name.to_string()))?;
        if locale != self.locale {
            info!("Response language changed {} -> {}", self.locale, locale);
            self.locale = locale;
            self.agent = None;
        }
        Ok(())
    }

    /// Parses and installs a table unless `name` is already the loaded
    /// source. Only the name is compared, so re-selecting the same file does
    /// not re-read it.
    pub fn load_table(&mut self, name: &str, bytes: &[u8]) -> Result<LoadOutcome, SessionError> {
        if self.source_name() == Some(name) {
            debug!("{} is already loaded, skipping", name);
            return Ok(LoadOutcome::Unchanged);
        }
        let table = Table::parse(bytes).map_err(|source| {
            warn!("Failed to parse {}: {}", name, source);
            SessionError::TableParse {
                name: name.to_string(),
                source,
            }
        })?;
        self.replace_table(name, table);
        Ok(LoadOutcome::Loaded)
    }

    /// Installs the built-in sample dataset. Always replaces whatever is
    /// loaded, even a previous sample.
    pub fn load_sample<R: Rng>(&mut self, rng: &mut R) {
        self.replace_table(SAMPLE_SOURCE_NAME, Table::sample(rng));
    }

    pub fn clear_table(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            info!("Cleared {}", loaded.name);
        }
        self.agent = None;
        self.transcript.clear();
    }

    pub fn clear_transcript(&mut self) {
        debug!("Cleared {} transcript entries", self.transcript.len());
        self.transcript.clear();
    }

    fn replace_table(&mut self, name: &str, table: Table) {
        info!(
            "Loaded {} ({} rows, {} columns)",
            name,
            table.row_count(),
            table.column_count()
        );
        self.loaded = Some(LoadedTable {
            name: name.to_string(),
            table: Arc::new(table),
        });
        self.agent = None;
        self.transcript.clear();
    }
}

impl<A: Send + Sync> Session<A> {
    /// Returns the bound agent, building it first if necessary. A failed
    /// build leaves the session without an agent and is not retried.
    pub async fn ensure_agent<F>(&mut self, factory: &F) -> Result<&A, SessionError>
    where
        F: AgentFactory<Agent = A>,
    {
        let agent = match self.agent.take() {
            Some(agent) => agent,
            None => {
                let table = self
                    .table()
                    .cloned()
                    .ok_or(SessionError::NoTableLoaded)?;
                let prompt = self.locale.system_prompt();
                debug!("Building agent for {} prompt", self.locale);
                factory.construct(table, prompt).await.map_err(|err| {
                    warn!("Agent construction failed: {:#}", err);
                    SessionError::AgentConstruction(format!("{err:#}"))
                })?
            }
        };
        Ok(self.agent.insert(agent))
    }

    /// Records the question, asks the agent, and records the answer or the
    /// failure. Invoker errors never escape; they become an assistant entry
    /// starting with `Error: `.
    pub async fn ask<I>(&mut self, question: &str, invoker: &I) -> Result<AskOutcome, SessionError>
    where
        I: Invoker<A>,
    {
        let Some(agent) = self.agent.as_ref() else {
            return Err(SessionError::NoAgent);
        };
        info!("Asking: {}", question.lines().next().unwrap_or(""));
        self.transcript.push(Speaker::User, question);
        match invoker.invoke(agent, question).await {
            Ok(answer) => {
                self.transcript.push(Speaker::Assistant, answer);
                Ok(AskOutcome::Answered)
            }
            Err(err) => {
                warn!("Question failed: {:#}", err);
                self.transcript
                    .push(Speaker::Assistant, format!("Error: {err:#}"));
                Ok(AskOutcome::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::locale::SUPPORTED_LOCALES;

    const VALID: &[u8] = b"product,sales\nA,10\nB,20\n";
    const OTHER: &[u8] = b"region,score\nNorth,1\n";

    #[derive(Debug, Clone, PartialEq)]
    struct StubAgent {
        id: usize,
        prompt: String,
        rows: usize,
    }

    #[derive(Default)]
    struct StubFactory {
        fail: bool,
        built: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl StubFactory {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AgentFactory for StubFactory {
        type Agent = StubAgent;

        async fn construct(&self, table: Arc<Table>, system_prompt: &str) -> Result<StubAgent> {
            self.prompts.lock().unwrap().push(system_prompt.to_string());
            if self.fail {
                bail!("model endpoint unreachable");
            }
            Ok(StubAgent {
                id: self.built.fetch_add(1, Ordering::SeqCst),
                prompt: system_prompt.to_string(),
                rows: table.row_count(),
            })
        }
    }

    struct FixedInvoker(std::result::Result<&'static str, &'static str>);

    #[async_trait]
    impl Invoker<StubAgent> for FixedInvoker {
        async fn invoke(&self, _agent: &StubAgent, _question: &str) -> Result<String> {
            match self.0 {
                Ok(answer) => Ok(answer.to_string()),
                Err(reason) => bail!("{reason}"),
            }
        }
    }

    fn entry(speaker: Speaker, text: &str) -> TranscriptEntry {
        TranscriptEntry {
            speaker,
            text: text.to_string(),
        }
    }

    async fn ready_session(factory: &StubFactory) -> Session<StubAgent> {
        let mut session = Session::default();
        session.load_table("a.csv", VALID).unwrap();
        session.ensure_agent(factory).await.unwrap();
        session
            .ask("first question", &FixedInvoker(Ok("first answer")))
            .await
            .unwrap();
        session
    }

    #[test]
    fn fresh_session_is_empty() {
        let session: Session<StubAgent> = Session::default();
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.locale(), Locale::English);
        assert!(session.table().is_none());
        assert!(session.source_name().is_none());
        assert!(session.agent().is_none());
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn same_locale_keeps_agent_and_different_locale_clears_it() {
        for locale in SUPPORTED_LOCALES {
            let factory = StubFactory::default();
            let mut session = Session::new(locale);
            session.load_table("a.csv", VALID).unwrap();
            session.ensure_agent(&factory).await.unwrap();

            session.set_locale(locale.name()).unwrap();
            session.set_locale(locale.name()).unwrap();
            assert_eq!(session.agent().map(|agent| agent.id), Some(0), "{locale}");

            for other in SUPPORTED_LOCALES.iter().filter(|other| **other != locale) {
                session.ensure_agent(&factory).await.unwrap();
                session.set_locale(other.name()).unwrap();
                assert!(session.agent().is_none(), "{locale} -> {other}");
                session.set_locale(locale.name()).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn invalid_locale_is_rejected_without_side_effects() {
        let factory = StubFactory::default();
        let mut session = ready_session(&factory).await;
        let table_before = Arc::clone(session.table().unwrap());
        let transcript_before = session.transcript().clone();

        let err = session.set_locale("Klingon").unwrap_err();
        assert!(matches!(err, SessionError::InvalidLocale(ref name) if name == "Klingon"));

        assert_eq!(session.locale(), Locale::English);
        assert_eq!(session.source_name(), Some("a.csv"));
        assert!(Arc::ptr_eq(session.table().unwrap(), &table_before));
        assert_eq!(session.agent().map(|agent| agent.id), Some(0));
        assert_eq!(session.transcript(), &transcript_before);
    }

    #[tokio::test]
    async fn reloading_the_same_name_is_a_no_op() {
        let factory = StubFactory::default();
        let mut session = ready_session(&factory).await;
        let table_before = Arc::clone(session.table().unwrap());
        let transcript_before = session.transcript().clone();

        let outcome = session.load_table("a.csv", VALID).unwrap();
        assert_eq!(outcome, LoadOutcome::Unchanged);
        assert!(Arc::ptr_eq(session.table().unwrap(), &table_before));
        assert_eq!(session.transcript(), &transcript_before);
        assert_eq!(session.state(), SessionState::Ready);

        // Content is never looked at when the name matches.
        let outcome = session.load_table("a.csv", b"").unwrap();
        assert_eq!(outcome, LoadOutcome::Unchanged);
        assert!(Arc::ptr_eq(session.table().unwrap(), &table_before));
    }

    #[tokio::test]
    async fn loading_a_new_name_resets_agent_and_transcript() {
        let factory = StubFactory::default();
        let mut session = ready_session(&factory).await;
        assert_eq!(session.transcript().len(), 2);

        let outcome = session.load_table("b.csv", OTHER).unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(session.source_name(), Some("b.csv"));
        assert_eq!(session.table().unwrap().columns(), ["region", "score"]);
        assert!(session.agent().is_none());
        assert!(session.transcript().is_empty());
        assert_eq!(session.state(), SessionState::Loaded);
    }

    #[tokio::test]
    async fn failed_parse_leaves_state_untouched() {
        let factory = StubFactory::default();
        let mut session = ready_session(&factory).await;
        let transcript_before = session.transcript().clone();

        let err = session.load_table("broken.csv", b"a,b\n1\n").unwrap_err();
        assert!(matches!(err, SessionError::TableParse { ref name, .. } if name == "broken.csv"));
        assert_eq!(session.source_name(), Some("a.csv"));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.transcript(), &transcript_before);

        let mut empty: Session<StubAgent> = Session::default();
        assert!(empty.load_table("empty.csv", b"").is_err());
        assert_eq!(empty.state(), SessionState::Empty);
    }

    #[tokio::test]
    async fn clear_table_resets_everything_from_any_state() {
        let mut empty: Session<StubAgent> = Session::default();
        empty.clear_table();

        let mut loaded: Session<StubAgent> = Session::default();
        loaded.load_table("a.csv", VALID).unwrap();
        loaded.clear_table();

        let factory = StubFactory::default();
        let mut ready = ready_session(&factory).await;
        ready.set_locale("Italian").unwrap();
        ready.clear_table();

        for session in [&empty, &loaded, &ready] {
            assert!(session.table().is_none());
            assert!(session.source_name().is_none());
            assert!(session.agent().is_none());
            assert!(session.transcript().is_empty());
            assert_eq!(session.state(), SessionState::Empty);
        }
        assert_eq!(ready.locale(), Locale::Italian);
    }

    #[tokio::test]
    async fn clear_transcript_keeps_table_and_agent() {
        let factory = StubFactory::default();
        let mut session = ready_session(&factory).await;
        session.clear_transcript();
        assert!(session.transcript().is_empty());
        assert_eq!(session.source_name(), Some("a.csv"));
        assert_eq!(session.agent().map(|agent| agent.id), Some(0));
    }

    #[tokio::test]
    async fn ask_without_agent_fails_and_records_nothing() {
        let mut session: Session<StubAgent> = Session::default();
        session.load_table("a.csv", VALID).unwrap();
        let err = session
            .ask("q", &FixedInvoker(Ok("unused")))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoAgent));
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn failed_question_is_recorded_as_assistant_error() {
        let factory = StubFactory::default();
        let mut session = ready_session(&factory).await;
        let before = session.transcript().len();

        let outcome = session
            .ask("q", &FixedInvoker(Err("rate limited")))
            .await
            .unwrap();
        assert_eq!(outcome, AskOutcome::Failed);

        let entries = session.transcript().entries();
        assert_eq!(entries.len(), before + 2);
        assert_eq!(entries[before], entry(Speaker::User, "q"));
        assert_eq!(entries[before + 1], entry(Speaker::Assistant, "Error: rate limited"));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn ensure_agent_requires_a_table() {
        let factory = StubFactory::default();
        let mut session: Session<StubAgent> = Session::default();
        let err = session.ensure_agent(&factory).await.unwrap_err();
        assert!(matches!(err, SessionError::NoTableLoaded));
        assert_eq!(factory.calls(), 0);
    }

    #[tokio::test]
    async fn ensure_agent_builds_at_most_once_until_invalidated() {
        let factory = StubFactory::default();
        let mut session: Session<StubAgent> = Session::default();
        session.load_table("a.csv", VALID).unwrap();

        let first = session.ensure_agent(&factory).await.unwrap().clone();
        let second = session.ensure_agent(&factory).await.unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first.rows, 2);
        assert_eq!(factory.calls(), 1);

        session.set_locale("Spanish").unwrap();
        let third = session.ensure_agent(&factory).await.unwrap();
        assert_eq!(third.id, 1);
        assert_eq!(factory.calls(), 2);
    }

    #[tokio::test]
    async fn agent_construction_failure_is_surfaced_once() {
        let factory = StubFactory::failing();
        let mut session: Session<StubAgent> = Session::default();
        session.load_table("a.csv", VALID).unwrap();

        let err = session.ensure_agent(&factory).await.unwrap_err();
        match err {
            SessionError::AgentConstruction(detail) => {
                assert!(detail.contains("model endpoint unreachable"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(session.agent().is_none());
        assert_eq!(session.state(), SessionState::Loaded);
        assert_eq!(factory.calls(), 1);
    }

    #[tokio::test]
    async fn sample_data_always_replaces() {
        let factory = StubFactory::default();
        let mut session = ready_session(&factory).await;
        let mut rng = StdRng::seed_from_u64(1);

        session.load_sample(&mut rng);
        assert_eq!(session.source_name(), Some(SAMPLE_SOURCE_NAME));
        assert_eq!(session.table().unwrap().row_count(), 50);
        assert!(session.agent().is_none());
        assert!(session.transcript().is_empty());

        let first = Arc::clone(session.table().unwrap());
        session.load_sample(&mut rng);
        assert!(!Arc::ptr_eq(session.table().unwrap(), &first));
    }

    #[tokio::test]
    async fn end_to_end_question_and_answer() {
        let mut csv = String::from("day,product,sales\n");
        for day in 1..=50 {
            csv.push_str(&format!("{day},Product {},{}\n", day % 3, day * 10));
        }

        let factory = StubFactory::default();
        let mut session: Session<StubAgent> = Session::default();
        assert_eq!(
            session.load_table("sales.csv", csv.as_bytes()).unwrap(),
            LoadOutcome::Loaded
        );
        assert_eq!(session.table().unwrap().row_count(), 50);

        let agent = session.ensure_agent(&factory).await.unwrap();
        assert_eq!(agent.rows, 50);
        assert!(session.agent().is_some());

        let outcome = session
            .ask("What are the basic statistics?", &FixedInvoker(Ok("mean=42")))
            .await
            .unwrap();
        assert_eq!(outcome, AskOutcome::Answered);
        assert_eq!(
            session.transcript().entries(),
            [
                entry(Speaker::User, "What are the basic statistics?"),
                entry(Speaker::Assistant, "mean=42"),
            ]
        );
    }

    #[tokio::test]
    async fn locale_change_rebuilds_agent_with_new_prompt() {
        let factory = StubFactory::default();
        let mut session = ready_session(&factory).await;
        let table_before = Arc::clone(session.table().unwrap());
        let transcript_before = session.transcript().clone();

        session.set_locale("French").unwrap();
        assert!(session.agent().is_none());
        assert_eq!(session.state(), SessionState::Loaded);
        assert!(Arc::ptr_eq(session.table().unwrap(), &table_before));
        assert_eq!(session.transcript(), &transcript_before);

        let agent = session.ensure_agent(&factory).await.unwrap();
        assert_eq!(agent.prompt, Locale::French.system_prompt());
        assert_eq!(
            factory.prompts.lock().unwrap().as_slice(),
            [
                Locale::English.system_prompt().to_string(),
                Locale::French.system_prompt().to_string(),
            ]
        );
    }
}
