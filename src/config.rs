use std::str::FromStr;
use std::time::Duration;

/// Process settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub http_workers: usize,

    pub scylla_nodes: Vec<String>,
    pub scylla_keyspace: String,

    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub llm_timeout_secs: u64,

    pub mask_generation_failures: bool,
    pub stub_user_identity: String,
    pub stub_user_email: String,

    pub sweep_stale_after_secs: i64,
    pub log_level: String,
}

fn parse_or<T: FromStr>(key: &str, raw: Option<&str>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(parsed) => parsed,
        Err(_) => {
            eprintln!("Config: {} = '{}' (parse failed, using default)", key, raw);
            default
        }
    }
}

fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(key, std::env::var(key).ok().as_deref(), default)
}

fn split_nodes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|node| !node.is_empty())
        .map(String::from)
        .collect()
}

impl Settings {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            eprintln!("Config: no .env file found, using environment and defaults");
        }

        let nodes = split_nodes(&env_var_or("SCYLLA_NODES", "127.0.0.1:9042".to_string()));

        Self {
            bind_addr: env_var_or("BIND_ADDR", "127.0.0.1:8080".to_string()),
            http_workers: env_var_or("HTTP_WORKERS", num_cpus::get()),
            scylla_nodes: if nodes.is_empty() {
                vec!["127.0.0.1:9042".to_string()]
            } else {
                nodes
            },
            scylla_keyspace: env_var_or("SCYLLA_KEYSPACE", "reaction_sim".to_string()),
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            openai_base_url: env_var_or("OPENAI_BASE_URL", "https://api.openai.com".to_string()),
            openai_model: env_var_or("OPENAI_MODEL", "gpt-4o-mini".to_string()),
            llm_temperature: env_var_or("LLM_TEMPERATURE", 0.9),
            llm_max_tokens: env_var_or("LLM_MAX_TOKENS", 2000),
            llm_timeout_secs: env_var_or("LLM_TIMEOUT_SECS", 30),
            mask_generation_failures: env_var_or("MASK_GENERATION_FAILURES", true),
            stub_user_identity: env_var_or("STUB_USER_IDENTITY", "test_user_mvp".to_string()),
            stub_user_email: env_var_or("STUB_USER_EMAIL", "test@example.com".to_string()),
            sweep_stale_after_secs: env_var_or("SWEEP_STALE_AFTER_SECS", 600),
            log_level: env_var_or("LOG_LEVEL", "debug".to_string()),
        }
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn log_filter(&self) -> log::LevelFilter {
        parse_or("LOG_LEVEL", Some(&self.log_level), log::LevelFilter::Debug)
    }
}
