use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rand::{distributions::Alphanumeric, Rng};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use web_service::config::{
    AiConfig, AppConfig, Environment, DEFAULT_BCRYPT_COST, DEFAULT_EXPLANATION_MODEL,
    DEFAULT_JWT_EXPIRES_DAYS, DEFAULT_PORT, DEFAULT_QUESTION_MODEL,
};

/// Interview-prep API server.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(long, env = "DATABASE_PATH", default_value = "data/interview-prep.db")]
    database_path: PathBuf,

    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Allowed CORS origin; any origin when unset.
    #[arg(long, env = "FRONTEND_URL")]
    frontend_url: Option<String>,

    /// `production` tightens rate limits.
    #[arg(long = "env", env = "APP_ENV", default_value = "development")]
    app_env: String,

    #[arg(long, env = "JWT_SECRET", default_value = "", hide_env_values = true)]
    jwt_secret: String,

    #[arg(long, env = "JWT_EXPIRES_DAYS", default_value_t = DEFAULT_JWT_EXPIRES_DAYS)]
    jwt_expires_days: i64,

    #[arg(long, env = "BCRYPT_COST", default_value_t = DEFAULT_BCRYPT_COST)]
    bcrypt_cost: u32,

    #[arg(long, env = "WORKERS")]
    workers: Option<usize>,

    #[arg(long, env = "GEMINI_API_KEY", default_value = "", hide_env_values = true)]
    gemini_api_key: String,

    #[arg(long, env = "GEMINI_BASE_URL")]
    gemini_base_url: Option<String>,

    #[arg(long, env = "AI_QUESTION_MODEL", default_value = DEFAULT_QUESTION_MODEL)]
    ai_question_model: String,

    #[arg(long, env = "AI_EXPLANATION_MODEL", default_value = DEFAULT_EXPLANATION_MODEL)]
    ai_explanation_model: String,

    /// Per-call model deadline; 0 disables it.
    #[arg(long, env = "AI_TIMEOUT_SECS", default_value_t = 60)]
    ai_timeout_secs: u64,

    #[arg(long, env = "AI_MAX_ATTEMPTS", default_value_t = 1)]
    ai_max_attempts: u32,

    /// Require every generated question to carry a question and an answer.
    #[arg(long, env = "AI_STRICT_QUESTIONS")]
    ai_strict_questions: bool,
}

impl Cli {
    fn into_config(self) -> AppConfig {
        let jwt_secret = if self.jwt_secret.trim().is_empty() {
            tracing::warn!("JWT_SECRET is not set; using a random secret, tokens will not survive a restart");
            random_secret()
        } else {
            self.jwt_secret
        };

        AppConfig {
            host: self.host,
            port: self.port,
            database_path: self.database_path,
            upload_dir: self.upload_dir,
            frontend_url: self.frontend_url.filter(|url| !url.trim().is_empty()),
            environment: Environment::parse(&self.app_env),
            jwt_secret,
            jwt_expires_days: self.jwt_expires_days,
            bcrypt_cost: self.bcrypt_cost,
            workers: self.workers,
            ai: AiConfig {
                api_key: self.gemini_api_key,
                base_url: self.gemini_base_url.filter(|url| !url.trim().is_empty()),
                question_model: self.ai_question_model,
                explanation_model: self.ai_explanation_model,
                timeout_secs: self.ai_timeout_secs,
                max_attempts: self.ai_max_attempts,
                strict_questions: self.ai_strict_questions,
            },
        }
    }
}

fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_line_number(true)
                .with_file(false),
        )
        .init();

    let config = Cli::parse().into_config();
    tracing::info!(
        environment = ?config.environment,
        database = %config.database_path.display(),
        "Starting interview-prep server"
    );

    web_service::run(config)
        .await
        .context("web service stopped with an error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flags_fill_the_config() {
        let cli = Cli::try_parse_from([
            "interview-prep-server",
            "--port",
            "8088",
            "--env",
            "production",
            "--jwt-secret",
            "s3cret",
            "--ai-max-attempts",
            "3",
            "--ai-strict-questions",
            "--frontend-url",
            "https://prep.example.com",
        ])
        .unwrap();
        let config = cli.into_config();

        assert_eq!(config.port, 8088);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.ai.max_attempts, 3);
        assert!(config.ai.strict_questions);
        assert_eq!(config.frontend_url.as_deref(), Some("https://prep.example.com"));
    }

    #[test]
    fn blank_secret_is_replaced() {
        let cli = Cli::try_parse_from(["interview-prep-server", "--jwt-secret", " "]).unwrap();
        let config = cli.into_config();
        assert_eq!(config.jwt_secret.len(), 48);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
