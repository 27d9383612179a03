pub mod agent;
pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod server;
pub mod ui;

use agent::{ AgentSettings, TravelAgent };
use cli::{ Args, ChatArgs, Command, ServeArgs };
use config::credentials::resolve_api_key;
use config::prompt::{ load_prompts, PromptCatalog };
use llm::chat::new_client as new_chat_client;
use llm::retry::RetryPolicy;
use llm::LlmConfig;
use log::{ error, info, warn };
use server::{ AppState, Server, TlsPaths };
use std::error::Error;
use std::num::NonZeroU32;
use std::path::{ Path, PathBuf };
use std::sync::Arc;
use std::time::Duration;
use ui::AgentApi;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.into_command() {
        Command::Serve(serve) => run_server(serve).await,
        Command::Chat(chat) => run_chat(chat).await,
    }
}

fn tls_paths(args: &ServeArgs) -> Result<Option<TlsPaths>, Box<dyn Error + Send + Sync>> {
    if !args.enable_tls {
        info!("TLS not enabled. Running plain HTTP server.");
        return Ok(None);
    }
    match (&args.tls_cert_path, &args.tls_key_path) {
        (Some(cert_path), Some(key_path)) =>
            Ok(
                Some(TlsPaths {
                    cert_path: cert_path.clone(),
                    key_path: key_path.clone(),
                })
            ),
        (Some(_), None) | (None, Some(_)) => {
            error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
            Err("Missing TLS certificate or key path".into())
        }
        (None, None) => {
            error!("--enable-tls was set but no certificate/key paths provided.");
            Err("TLS enabled without cert/key".into())
        }
    }
}

pub async fn run_server(args: ServeArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = args.listen_addr();

    info!("--- Core Configuration ---");
    info!("Server Address: {}", addr);
    info!("Public Directory: {}", args.public_dir);
    info!("Chat Endpoint: {}", args.chat_base_url);
    info!("Chat Model: {}", args.chat_model);
    info!("Temperature: {}", args.temperature);
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("Max Attempts: {}", args.max_attempts);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("builtin"));
    info!("Rate Limit: {}/s", args.rate_limit_per_second);
    info!("-------------------------");

    let api_key = resolve_api_key(args.chat_api_key.as_deref(), Path::new(&args.env_file)).map_err(|e| {
        error!("{}", e);
        e
    })?;

    let prompts = match &args.prompts_path {
        Some(path) => load_prompts(path).map_err(|e| format!("Failed to load prompts file '{}': {}", path, e))?,
        None => PromptCatalog::builtin(),
    };

    let llm_config = LlmConfig {
        api_key: Some(api_key),
        completion_model: Some(args.chat_model.clone()),
        base_url: Some(args.chat_base_url.clone()),
        request_timeout: Some(Duration::from_secs(args.request_timeout_secs)),
        retry: RetryPolicy::default().with_max_attempts(args.max_attempts),
    };
    let chat_client = new_chat_client(&llm_config)?;

    let agent = TravelAgent::new(chat_client, Arc::new(prompts), AgentSettings {
        model: args.chat_model.clone(),
        temperature: args.temperature,
    });

    let rate = NonZeroU32::new(args.rate_limit_per_second);
    if rate.is_none() {
        warn!("API rate limiting disabled.");
    }
    let state = AppState::new(agent, PathBuf::from(&args.public_dir), rate);

    let tls = tls_paths(&args)?;
    info!("Starting server on: {}", addr);
    Server::new(addr, state, tls).run().await
}

pub async fn run_chat(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let api = AgentApi::new(&args.url, &args.endpoint, Some(Duration::from_secs(args.timeout_secs)))?;
    ui::terminal::run_terminal_chat(api).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn serve_args(extra: &[&str]) -> ServeArgs {
        let argv = ["travel-agent", "serve", "--enable-tls"].into_iter().chain(extra.iter().copied());
        match Args::try_parse_from(argv).unwrap().into_command() {
            Command::Serve(serve) => serve,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn tls_with_only_a_cert_fails() {
        assert!(tls_paths(&serve_args(&["--tls-cert-path", "cert.pem"])).is_err());
    }

    #[test]
    fn tls_with_only_a_key_fails() {
        assert!(tls_paths(&serve_args(&["--tls-key-path", "key.pem"])).is_err());
    }

    #[test]
    fn tls_without_paths_fails() {
        assert!(tls_paths(&serve_args(&[])).is_err());
    }

    #[test]
    fn tls_with_both_paths_is_enabled() {
        let tls = tls_paths(&serve_args(&["--tls-cert-path", "cert.pem", "--tls-key-path", "key.pem"]))
            .unwrap()
            .expect("TLS should be enabled");
        assert_eq!(tls.cert_path, "cert.pem");
        assert_eq!(tls.key_path, "key.pem");
    }

    #[test]
    fn tls_disabled_by_default() {
        let args = Args::try_parse_from(["travel-agent", "serve"]).unwrap();
        let Command::Serve(serve) = args.into_command() else {
            panic!("expected serve");
        };
        assert!(tls_paths(&serve).unwrap().is_none());
    }
}
