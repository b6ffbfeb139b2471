//! In-memory provider for exercising the search core

use super::error::FetchError;
use crate::provider::RepositoryProvider;
use crate::query::Query;
use crate::results::SearchResultSet;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify};

/// Answers queries from a script, optionally holding them until released
pub struct ScriptedProvider {
    responses: Mutex<HashMap<String, Result<SearchResultSet, FetchError>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
    call_count: watch::Sender<usize>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            call_count: watch::channel(0).0,
        }
    }

    /// Answer `query` with `result` (unscripted queries get an empty set)
    pub fn respond(&self, query: &Query, result: Result<SearchResultSet, FetchError>) {
        self.responses
            .lock()
            .unwrap()
            .insert(query.to_string(), result);
    }

    /// Hold `query` until the returned gate is notified
    pub fn hold(&self, query: &Query) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(query.to_string(), gate.clone());
        gate
    }

    /// Queries received so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.call_count.subscribe();
        rx.wait_for(|count| *count >= n).await.unwrap();
    }
}

#[async_trait]
impl RepositoryProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, query: &Query) -> Result<SearchResultSet, FetchError> {
        let key = query.to_string();
        self.calls.lock().unwrap().push(key.clone());
        self.call_count.send_modify(|count| *count += 1);

        let gate = self.gates.lock().unwrap().get(&key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(SearchResultSet::default()))
    }
}
