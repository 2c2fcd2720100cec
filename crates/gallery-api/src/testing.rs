//! In-memory upstream used by tests

use async_trait::async_trait;
use s3_listing_client::{ObjectLister, ObjectPage, PageRequest, Result, UpstreamError};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued results in order and records every request
#[derive(Default)]
pub struct ScriptedLister {
    responses: Mutex<VecDeque<Result<ObjectPage>>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedLister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Result<ObjectPage>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_keys(&self, keys: &[&str]) {
        self.push(Ok(ObjectPage {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        }));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectLister for ScriptedLister {
    async fn list_page(&self, request: &PageRequest) -> Result<ObjectPage> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::Other("no scripted response".to_string())))
    }
}
