//! Scripted backend for tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::backend::{GenerationBackend, ProviderError};
use super::prompt::GenerationRequest;
use super::strategy::ProviderStrategy;

/// One recorded provider call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub structured_output: bool,
    pub at: Instant,
}

/// Backend that replays queued responses per model
///
/// When a model's queue is empty the model's fallback error is returned, or
/// `NotFound` if none was set.
#[derive(Default)]
pub struct ScriptedBackend {
    queues: Mutex<HashMap<String, VecDeque<Result<String, ProviderError>>>>,
    fallbacks: Mutex<HashMap<String, ProviderError>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, model: &str, response: Result<String, ProviderError>) {
        self.queues
            .lock()
            .expect("queue lock poisoned")
            .entry(model.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn set_fallback(&self, model: &str, error: ProviderError) {
        self.fallbacks
            .lock()
            .expect("fallback lock poisoned")
            .insert(model.to_string(), error);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock poisoned").len()
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model).collect()
    }

    /// Time between consecutive calls
    pub fn gaps(&self) -> Vec<Duration> {
        self.calls()
            .windows(2)
            .map(|w| w[1].at.duration_since(w[0].at))
            .collect()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(
        &self,
        strategy: &ProviderStrategy,
        _request: &GenerationRequest,
    ) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(RecordedCall {
                model: strategy.model.clone(),
                structured_output: strategy.structured_output,
                at: Instant::now(),
            });

        let queued = self
            .queues
            .lock()
            .expect("queue lock poisoned")
            .get_mut(&strategy.model)
            .and_then(|q| q.pop_front());

        match queued {
            Some(response) => response,
            None => Err(self
                .fallbacks
                .lock()
                .expect("fallback lock poisoned")
                .get(&strategy.model)
                .cloned()
                .unwrap_or_else(|| ProviderError::NotFound(strategy.model.clone()))),
        }
    }
}

/// A fenced, commentary-wrapped payload of `count` valid questions
pub fn fenced_batch(count: usize) -> String {
    let items: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "question": format!("Question {}?", i + 1),
                "options": ["A", "B", "C", "D"],
                "correctIndex": i % 4,
                "explanation": format!("Because {}", i + 1),
                "topic": "Networking"
            })
        })
        .collect();
    format!(
        "Here are your questions:\n```json\n{}\n```\nGood luck!",
        serde_json::Value::Array(items)
    )
}
