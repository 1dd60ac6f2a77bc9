//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use greenprompt::api::{
    CompressionRequest, CompressionResponse, CompressionService, HealthResponse, ServiceError,
};

/// A compression service that replays scripted results and records every
/// request it receives.
#[derive(Default)]
pub struct ScriptedService {
    compress_results: RefCell<VecDeque<Result<CompressionResponse, ServiceError>>>,
    health_result: RefCell<Option<Result<HealthResponse, ServiceError>>>,
    requests: RefCell<Vec<CompressionRequest>>,
    health_calls: RefCell<usize>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, result: Result<CompressionResponse, ServiceError>) -> Self {
        self.compress_results.borrow_mut().push_back(result);
        self
    }

    pub fn health(self, result: Result<HealthResponse, ServiceError>) -> Self {
        *self.health_result.borrow_mut() = Some(result);
        self
    }

    pub fn requests(&self) -> Vec<CompressionRequest> {
        self.requests.borrow().clone()
    }

    pub fn health_calls(&self) -> usize {
        *self.health_calls.borrow()
    }
}

impl CompressionService for ScriptedService {
    fn health(&self) -> Result<HealthResponse, ServiceError> {
        *self.health_calls.borrow_mut() += 1;
        self.health_result
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Err(ServiceError::Transport("no health scripted".to_string())))
    }

    fn compress(&self, request: &CompressionRequest) -> Result<CompressionResponse, ServiceError> {
        self.requests.borrow_mut().push(request.clone());
        self.compress_results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Transport("no response scripted".to_string())))
    }
}

/// The service payload used in the worked example.
pub fn sample_response(compressed: &str) -> CompressionResponse {
    CompressionResponse {
        original_prompt: String::new(),
        compressed_prompt: compressed.to_string(),
        original_tokens: 100,
        compressed_tokens: 70,
        compression_ratio: 1.43,
        tokens_saved: 30,
        energy_saved_kwh: 0.009,
        co2_saved_kg: 0.004275,
    }
}

pub fn healthy(llmlingua: bool) -> HealthResponse {
    HealthResponse {
        status: "healthy".to_string(),
        llmlingua_available: llmlingua,
        compression_methods: vec![
            llmlingua.then(|| "llmlingua".to_string()),
            Some("simple".to_string()),
        ],
    }
}
