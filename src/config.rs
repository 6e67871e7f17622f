use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        es_url: get_env_or_default("ES_URL", "http://localhost:9200"),
        es_index: get_env_or_default("ES_INDEX", "courses"),
        bind_addr: get_env_or_default("BIND_ADDR", "0.0.0.0:8080"),
    }
});

pub struct Config {
    pub es_url: String,
    pub es_index: String,
    pub bind_addr: String,
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
