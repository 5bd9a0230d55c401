use html_escape::encode_text;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{error, info, warn};

use super::extraction_client::Conversation;
use super::prompt::{build_extraction_prompt, ExtractionRequest, OutputContract};
use super::render::render_table;
use super::response_parser::{parse_records, ParseError};
use crate::core::types::Record;
use crate::scraping::{reduce_to_body, FetchError};
use crate::AppState;

/// Shown when a batch brings nothing back.
pub const NO_MORE_RESORTS: &str = "<p>No more resorts found matching your criteria.</p>";

pub const FORMAT_ERROR_MESSAGE: &str = "<p>Sorry, I received an invalid format from the extraction service. I can't process the results.</p>";

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Format(#[from] ParseError),
    #[error("{0:#}")]
    Service(anyhow::Error),
}

impl ExtractionError {
    /// The chat reply for this failure. Format errors never echo the payload.
    pub fn user_message(&self) -> String {
        match self {
            ExtractionError::Fetch(e) => format!(
                "<p>Sorry, I couldn't access the website at that URL. Error: {}</p>",
                encode_text(&e.chain_message())
            ),
            ExtractionError::Format(_) => FORMAT_ERROR_MESSAGE.to_string(),
            ExtractionError::Service(e) => format!(
                "<p>Sorry, an unexpected error occurred: {}</p>",
                encode_text(&format!("{:#}", e))
            ),
        }
    }
}

/// What one batch contributed to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The service returned an empty (or null) array.
    Empty,
    /// Every returned record was already collected.
    AllSeen,
    /// Records added to the session, in reply order.
    Added(Vec<Record>),
}

impl BatchOutcome {
    /// Table of the newly added records, or `None` when nothing was added.
    pub fn render(&self) -> Option<String> {
        match self {
            BatchOutcome::Added(records) => Some(render_table(records)),
            BatchOutcome::Empty | BatchOutcome::AllSeen => None,
        }
    }
}

/// Inputs for one batch.
pub struct BatchContext<'a> {
    pub url: &'a str,
    pub criteria: &'a str,
    pub page_offset: usize,
}

/// Fetch → reduce → prompt → extraction service → parse → merge.
///
/// `collected` only grows, and only with records whose name it does not
/// already hold. On error nothing is merged.
pub async fn extract_batch(
    state: &AppState,
    conversation: &mut Conversation,
    collected: &mut Vec<Record>,
    ctx: BatchContext<'_>,
) -> Result<BatchOutcome, ExtractionError> {
    let start_time = Instant::now();
    info!(
        "Extracting batch at offset {} ({} records collected so far)",
        ctx.page_offset,
        collected.len()
    );

    let raw_html = state.page_source.fetch_page(ctx.url).await?;
    let html = reduce_to_body(&raw_html);

    let seen_names: Vec<String> = collected.iter().map(|r| r.resort_name.clone()).collect();
    let contract = if state.extraction.structured_output() {
        OutputContract::Structured
    } else {
        OutputContract::JsonArray
    };
    let prompt = build_extraction_prompt(&ExtractionRequest {
        criteria: ctx.criteria,
        page_offset: ctx.page_offset,
        seen_names: &seen_names,
        html: &html,
        contract,
    });

    let reply = state
        .extraction
        .send_message(conversation, prompt)
        .await
        .map_err(ExtractionError::Service)?;

    let batch = parse_records(&reply)?;
    if batch.is_empty() {
        info!("Extraction service returned an empty batch");
        return Ok(BatchOutcome::Empty);
    }

    let returned = batch.len();
    let added = merge_new_records(collected, batch);
    info!(
        "Batch returned {} records, {} new, in {}ms",
        returned,
        added.len(),
        start_time.elapsed().as_millis()
    );

    if added.is_empty() {
        Ok(BatchOutcome::AllSeen)
    } else {
        Ok(BatchOutcome::Added(added))
    }
}

/// Appends records whose name is not yet in `collected`; returns the appended ones.
/// Duplicates inside `batch` itself are dropped too, first occurrence wins.
pub fn merge_new_records(collected: &mut Vec<Record>, batch: Vec<Record>) -> Vec<Record> {
    let mut seen: HashSet<String> = collected.iter().map(|r| r.resort_name.clone()).collect();
    let mut added = Vec::new();

    for record in batch {
        if seen.insert(record.resort_name.clone()) {
            collected.push(record.clone());
            added.push(record);
        }
    }

    added
}

/// Logs a failed batch at the level its kind deserves.
pub fn log_failure(err: &ExtractionError) {
    match err {
        ExtractionError::Fetch(e) => warn!("Listing page fetch failed: {}", e.chain_message()),
        ExtractionError::Format(e) => warn!("Extraction reply rejected: {}", e),
        ExtractionError::Service(e) => error!("An error occurred during extraction: {:#}", e),
    }
}
