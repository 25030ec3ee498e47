//! Mock generator for tests
//!
//! Returns canned candidates or a canned error without touching the network,
//! and counts how often it was asked.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{CandidatePost, ContentGenerator, GenerationRequest};
use crate::error::{RemoteError, Result};

#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    candidates: Vec<CandidatePost>,
    error: Option<RemoteError>,
    calls: Arc<Mutex<usize>>,
}

impl MockGenerator {
    /// A generator that always answers with `candidates`
    pub fn with_candidates(candidates: Vec<CandidatePost>) -> Self {
        Self {
            candidates,
            ..Default::default()
        }
    }

    /// A generator that always fails with `error`
    pub fn failing(error: RemoteError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    /// Number of `generate` calls that reached this mock
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
        credential: &str,
    ) -> Result<Vec<CandidatePost>> {
        if credential.trim().is_empty() {
            return Err(RemoteError::MissingCredential("mock generator key".to_string()).into());
        }
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        match &self.error {
            Some(error) => Err(error.clone().into()),
            None => Ok(self.candidates.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
