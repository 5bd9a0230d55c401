#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use resort_scout::chat::SessionStore;
use resort_scout::scraping::{FetchError, PageSource};
use resort_scout::tools::{Conversation, ExtractionService};
use resort_scout::AppState;

pub const LISTING_HTML: &str = r#"<html><head><title>Resorts</title></head>
<body><ul class="listing"><li>Sol Mar, Spain</li><li>Lago Verde, Italy</li></ul></body></html>"#;

pub fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

/// Serves one canned page; individual fetches can be made to fail.
#[derive(Default)]
pub struct StubPages {
    failures: Mutex<VecDeque<u16>>,
    pub fetched: Mutex<Vec<String>>,
}

impl StubPages {
    /// The next fetch answers with `status`.
    pub fn fail_next(&self, status: u16) {
        self.failures.lock().unwrap().push_back(status);
    }
}

#[async_trait]
impl PageSource for StubPages {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        if let Some(status) = self.failures.lock().unwrap().pop_front() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(LISTING_HTML.to_string())
    }
}

/// Replies with scripted texts in order and keeps every prompt it was sent.
#[derive(Default)]
pub struct ScriptedService {
    replies: Mutex<VecDeque<Result<String, String>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub fn reply(&self, text: impl Into<String>) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn fail(&self, message: impl Into<String>) -> &Self {
        self.replies.lock().unwrap().push_back(Err(message.into()));
        self
    }

    pub fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ExtractionService for ScriptedService {
    async fn send_message(
        &self,
        conversation: &mut Conversation,
        prompt: String,
    ) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("[]".to_string()));
        match next {
            Ok(text) => {
                conversation.push_turn(prompt, text.clone());
                Ok(text)
            }
            Err(message) => Err(anyhow::anyhow!(message)),
        }
    }
}

pub struct Harness {
    pub pages: Arc<StubPages>,
    pub service: Arc<ScriptedService>,
    pub state: Arc<AppState>,
}

pub fn harness() -> Harness {
    init_logger();
    let pages = Arc::new(StubPages::default());
    let service = Arc::new(ScriptedService::default());
    let state = Arc::new(AppState::new(
        pages.clone(),
        service.clone(),
        SessionStore::new(Duration::from_secs(60), 4),
    ));
    Harness {
        pages,
        service,
        state,
    }
}

/// A JSON array reply with one record per `(name, country)`.
pub fn batch_reply(resorts: &[(&str, &str)]) -> String {
    let records: Vec<serde_json::Value> = resorts
        .iter()
        .map(|(name, country)| {
            serde_json::json!({
                "Resort Name": name,
                "Country": country,
                "Description": format!("{} description", name),
                "Star Rating": "4",
                "Price": "N/A",
                "Main Picture": format!("https://img.example/{}.jpg", name.replace(' ', "-")),
            })
        })
        .collect();
    serde_json::Value::Array(records).to_string()
}
