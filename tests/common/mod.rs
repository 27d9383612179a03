#![allow(dead_code)]

use std::fs;
use std::num::NonZeroU32;
use std::sync::Arc;

use tempfile::TempDir;
use travel_agent::agent::{ AgentSettings, TravelAgent };
use travel_agent::config::prompt::PromptCatalog;
use travel_agent::llm::chat::new_client;
use travel_agent::llm::retry::RetryPolicy;
use travel_agent::llm::LlmConfig;
use travel_agent::server::AppState;
use wiremock::MockServer;

pub const INDEX_HTML: &str = "<!doctype html><title>Reiseagent</title>";

pub fn public_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    fs::write(dir.path().join("app.js"), "console.log('hi');").unwrap();
    dir
}

pub fn app_state(upstream: &MockServer, public: &TempDir, rate: Option<u32>) -> AppState {
    let config = LlmConfig {
        api_key: Some("test-key".to_string()),
        completion_model: None,
        base_url: Some(format!("{}/v1/chat/completions", upstream.uri())),
        request_timeout: None,
        retry: RetryPolicy::no_retry(),
    };
    let client = new_client(&config).unwrap();
    let agent = TravelAgent::new(client, Arc::new(PromptCatalog::builtin()), AgentSettings::default());
    AppState::new(agent, public.path().to_path_buf(), rate.and_then(NonZeroU32::new))
}
