/// Secrets and process settings loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_token: String,
    /// Alert recipients; also the allow-list for operator commands.
    pub telegram_chat_ids: Vec<i64>,

    // Narrative generator
    pub openai_api_key: Option<String>,
    pub openai_model: String,

    // Signal config file path
    pub signal_config_path: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            telegram_token: required_env("TELEGRAM_TOKEN"),
            telegram_chat_ids: parse_chat_ids(&required_env("TELEGRAM_CHAT_IDS")),
            openai_api_key: optional_env("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            openai_model: optional_env("OPENAI_MODEL")
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            signal_config_path: optional_env("SIGNAL_CONFIG_PATH")
                .unwrap_or_else(|| "config/signals.toml".to_string()),
        }
    }
}

fn parse_chat_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().unwrap_or_else(|_| {
                panic!("TELEGRAM_CHAT_IDS contains non-numeric ID: '{s}'")
            })
        })
        .collect()
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
