use std::sync::Arc;

use crate::chat::session::SessionStore;
use crate::core::config::ScoutConfig;
use crate::scraping::{HttpPageFetcher, PageSource};
use crate::tools::extraction_client::{ExtractionService, OpenAiCompatClient};

#[derive(Clone)]
pub struct AppState {
    pub page_source: Arc<dyn PageSource>,
    pub extraction: Arc<dyn ExtractionService>,
    pub sessions: SessionStore,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("structured_output", &self.extraction.structured_output())
            .field("sessions", &self.sessions)
            .finish()
    }
}

impl AppState {
    pub fn new(
        page_source: Arc<dyn PageSource>,
        extraction: Arc<dyn ExtractionService>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            page_source,
            extraction,
            sessions,
        }
    }

    /// Wires the HTTP fetcher, the extraction client and the session store.
    /// Fails when the extraction credential is missing.
    pub fn from_config(config: &ScoutConfig) -> anyhow::Result<Self> {
        let page_source = Arc::new(HttpPageFetcher::new(&config.fetch)?);
        let extraction = Arc::new(OpenAiCompatClient::from_config(&config.extraction)?);
        let sessions = SessionStore::new(
            config.session.resolve_idle_timeout(),
            config.extraction.resolve_max_history_turns(),
        );
        Ok(Self::new(page_source, extraction, sessions))
    }
}
