use clap::{ Args as ClapArgs, Parser, Subcommand };

use crate::llm::{ DEFAULT_CHAT_MODEL, DEFAULT_CHAT_URL };
use crate::ui::client::DEFAULT_ENDPOINT;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    // used when no subcommand is given
    #[command(flatten)]
    pub serve: ServeArgs,
}

impl Args {
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the agent API and the browser front-end (default).
    Serve(ServeArgs),
    /// Chat with a running server from the terminal.
    Chat(ChatArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    // --- Server Args ---
    /// Host address and port for the server to listen on. Defaults to 127.0.0.1:$PORT, or port 3000.
    #[arg(long, env = "SERVER_ADDR")]
    pub server_addr: Option<String>,

    /// Port used when no server address is given.
    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Directory holding the static front-end files.
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: String,

    /// Requests per second accepted on the /api routes. 0 disables the limit.
    #[arg(long, env = "RATE_LIMIT_PER_SECOND", default_value = "10")]
    pub rate_limit_per_second: u32,

    // --- Chat LLM Provider Args ---
    /// API key for the chat completion provider.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub chat_api_key: Option<String>,

    /// key=value file consulted for OPENAI_API_KEY when no key is given directly.
    #[arg(long, env = "ENV_FILE", default_value = ".env.txt")]
    pub env_file: String,

    /// Full URL of the chat completions endpoint.
    #[arg(long, env = "CHAT_BASE_URL", default_value = DEFAULT_CHAT_URL)]
    pub chat_base_url: String,

    /// Model name for chat completion (e.g., gpt-4o).
    #[arg(long, env = "CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub chat_model: String,

    /// Sampling temperature sent with every completion.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub temperature: f32,

    /// Upper bound in seconds for one completion call.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,

    /// Total attempts per completion, retrying rate limits and upstream 5xx. 1 disables retries.
    #[arg(long, env = "MAX_ATTEMPTS", default_value = "3")]
    pub max_attempts: u32,

    /// Optional JSON file overriding the builtin prompts ({"classic": ..., "bundled": ...}).
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    // --- TLS Args ---
    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    /// Path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,
}

impl ServeArgs {
    pub fn listen_addr(&self) -> String {
        match &self.server_addr {
            Some(addr) if !addr.trim().is_empty() => addr.trim().to_string(),
            _ => format!("127.0.0.1:{}", self.port),
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ChatArgs {
    /// Base URL of a running travel agent server.
    #[arg(long, env = "AGENT_URL", default_value = "http://127.0.0.1:3000")]
    pub url: String,

    /// Agent endpoint that accepts {"messages": [...]}.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Upper bound in seconds for one round trip. Keep it above the server's retry budget
    /// (3 attempts of 60s plus backoff with the default serve flags).
    #[arg(long, env = "AGENT_TIMEOUT_SECS", default_value = "200")]
    pub timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let args = Args::try_parse_from(["travel-agent", "--port", "8080", "--max-attempts", "1"]).unwrap();
        match args.into_command() {
            Command::Serve(serve) => {
                assert_eq!(serve.listen_addr(), "127.0.0.1:8080");
                assert_eq!(serve.max_attempts, 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn explicit_server_addr_wins_over_port() {
        let args = Args::try_parse_from([
            "travel-agent",
            "serve",
            "--server-addr",
            "0.0.0.0:4000",
            "--port",
            "8080",
        ]).unwrap();
        let Command::Serve(serve) = args.into_command() else {
            panic!("expected serve");
        };
        assert_eq!(serve.listen_addr(), "0.0.0.0:4000");
    }

    #[test]
    fn chat_timeout_outlasts_default_server_retries() {
        let Command::Serve(serve) = Args::try_parse_from(["travel-agent"]).unwrap().into_command() else {
            panic!("expected serve");
        };
        let Command::Chat(chat) = Args::try_parse_from(["travel-agent", "chat"]).unwrap().into_command() else {
            panic!("expected chat");
        };
        let server_budget = u64::from(serve.max_attempts) * serve.request_timeout_secs + 10;
        assert!(chat.timeout_secs > server_budget);
    }

    #[test]
    fn chat_subcommand_parses() {
        let args = Args::try_parse_from(["travel-agent", "chat", "--url", "http://example.test"]).unwrap();
        let Command::Chat(chat) = args.into_command() else {
            panic!("expected chat");
        };
        assert_eq!(chat.url, "http://example.test");
        assert_eq!(chat.endpoint, "/api/agent");
    }
}
