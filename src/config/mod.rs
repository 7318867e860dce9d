use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub langbase: LangbaseConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub pipes: PipeConfig,
    pub docs: DocsConfig,
    pub workflow: WorkflowConfig,
}

/// Langbase API configuration
#[derive(Debug, Clone)]
pub struct LangbaseConfig {
    pub api_key: String,
    pub base_url: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// Langbase pipe names backing the two generation services.
///
/// `deep` serves the Planner and Mentor phases, `fast` serves the Librarian.
#[derive(Debug, Clone)]
pub struct PipeConfig {
    pub deep: String,
    pub fast: String,
}

/// Documentation fetching configuration
#[derive(Debug, Clone)]
pub struct DocsConfig {
    pub user_agent: String,
    pub timeout_ms: u64,
    pub max_sections_per_tech: usize,
}

/// Bounds applied when the phases assemble prompts.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Maximum documentation entries quoted in the Librarian synthesis prompt.
    pub synthesis_entry_cap: usize,
    /// Maximum documentation entries quoted in the Mentor prompt.
    pub mentor_entry_cap: usize,
    /// Number of code patterns requested from the semantic index.
    pub pattern_top_k: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let langbase = LangbaseConfig {
            api_key: env::var("LANGBASE_API_KEY").map_err(|_| AppError::Config {
                message: "LANGBASE_API_KEY is required".to_string(),
            })?,
            base_url: env::var("LANGBASE_BASE_URL")
                .unwrap_or_else(|_| "https://api.langbase.com".to_string()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/architect.db".to_string()),
            ),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env_parse("REQUEST_TIMEOUT_MS", 30000),
            max_retries: env_parse("MAX_RETRIES", 3),
            retry_delay_ms: env_parse("RETRY_DELAY_MS", 1000),
        };

        let pipes = PipeConfig {
            deep: env::var("PIPE_DEEP").unwrap_or_else(|_| "architect-deep-v1".to_string()),
            fast: env::var("PIPE_FAST").unwrap_or_else(|_| "architect-fast-v1".to_string()),
        };

        let defaults = DocsConfig::default();
        let docs = DocsConfig {
            user_agent: env::var("DOCS_USER_AGENT").unwrap_or(defaults.user_agent),
            timeout_ms: env_parse("DOCS_TIMEOUT_MS", defaults.timeout_ms),
            max_sections_per_tech: env_parse("DOCS_MAX_SECTIONS", defaults.max_sections_per_tech),
        };

        let defaults = WorkflowConfig::default();
        let workflow = WorkflowConfig {
            synthesis_entry_cap: env_parse("SYNTHESIS_ENTRY_CAP", defaults.synthesis_entry_cap),
            mentor_entry_cap: env_parse("MENTOR_ENTRY_CAP", defaults.mentor_entry_cap),
            pattern_top_k: env_parse("PATTERN_TOP_K", defaults.pattern_top_k),
        };

        Ok(Config {
            langbase,
            database,
            logging,
            request,
            pipes,
            docs,
            workflow,
        })
    }
}

/// Read and parse an environment variable, falling back to `default`
/// when it is unset or unparseable.
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            user_agent: "Architect-Bot/1.0".to_string(),
            timeout_ms: 30000,
            max_sections_per_tech: 5,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            synthesis_entry_cap: 15,
            mentor_entry_cap: 8,
            pattern_top_k: 3,
        }
    }
}
