//! Runtime configuration for the web service.
//!
//! The standalone binary fills [`AppConfig`] from CLI flags and environment
//! variables; tests build it directly from [`AppConfig::default`].

use std::path::PathBuf;
use std::time::Duration;

use ai_pipeline::{ModelSelection, PipelineConfig, QuestionShapePolicy, RetryPolicy};
use prep_llm::ModelId;

pub use prep_llm::{DEFAULT_EXPLANATION_MODEL, DEFAULT_QUESTION_MODEL};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_JWT_EXPIRES_DAYS: i64 = 7;
pub const DEFAULT_BCRYPT_COST: u32 = 12;
pub const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Anything other than `production` (case-insensitive) is development.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Settings for the generative-AI endpoints.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub question_model: String,
    pub explanation_model: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub strict_questions: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            question_model: DEFAULT_QUESTION_MODEL.to_string(),
            explanation_model: DEFAULT_EXPLANATION_MODEL.to_string(),
            timeout_secs: 60,
            max_attempts: 1,
            strict_questions: false,
        }
    }
}

impl AiConfig {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            models: ModelSelection {
                questions: ModelId::new(self.question_model.clone()),
                explanation: ModelId::new(self.explanation_model.clone()),
            },
            // zero disables the deadline
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            question_policy: QuestionShapePolicy::from_strict_flag(self.strict_questions),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(500))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    /// Allowed CORS origin. `None` accepts any origin.
    pub frontend_url: Option<String>,
    pub environment: Environment,
    pub jwt_secret: String,
    pub jwt_expires_days: i64,
    pub bcrypt_cost: u32,
    pub workers: Option<usize>,
    pub ai: AiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            database_path: PathBuf::from("data/interview-prep.db"),
            upload_dir: PathBuf::from("uploads"),
            frontend_url: None,
            environment: Environment::default(),
            jwt_secret: String::new(),
            jwt_expires_days: DEFAULT_JWT_EXPIRES_DAYS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            workers: None,
            ai: AiConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn rate_limits(&self) -> RateLimitConfig {
        RateLimitConfig::for_environment(self.environment)
    }
}

/// One fixed-window style budget: at most `max_requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub window: Duration,
    pub max_requests: u32,
}

impl RateLimitRule {
    pub const fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
        }
    }

    /// Window length in whole minutes, rounded up.
    pub fn window_minutes(&self) -> u64 {
        self.window.as_secs().div_ceil(60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub general: RateLimitRule,
    pub auth: RateLimitRule,
    pub ai: RateLimitRule,
    pub upload: RateLimitRule,
}

const FIFTEEN_MINUTES: Duration = Duration::from_secs(15 * 60);
const ONE_HOUR: Duration = Duration::from_secs(60 * 60);

impl RateLimitConfig {
    pub fn for_environment(environment: Environment) -> Self {
        let production = environment.is_production();
        Self {
            general: RateLimitRule::new(FIFTEEN_MINUTES, if production { 200 } else { 1000 }),
            auth: RateLimitRule::new(FIFTEEN_MINUTES, if production { 25 } else { 100 }),
            ai: RateLimitRule::new(ONE_HOUR, 20),
            upload: RateLimitRule::new(FIFTEEN_MINUTES, 10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing_defaults_to_development() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse(" PRODUCTION "), Environment::Production);
        assert_eq!(Environment::parse("staging"), Environment::Development);
        assert_eq!(Environment::parse(""), Environment::Development);
    }

    #[test]
    fn production_limits_are_tighter() {
        let dev = RateLimitConfig::for_environment(Environment::Development);
        let prod = RateLimitConfig::for_environment(Environment::Production);

        assert_eq!(dev.general.max_requests, 1000);
        assert_eq!(prod.general.max_requests, 200);
        assert_eq!(dev.auth.max_requests, 100);
        assert_eq!(prod.auth.max_requests, 25);
        assert_eq!(prod.ai, RateLimitRule::new(ONE_HOUR, 20));
        assert_eq!(prod.upload.window_minutes(), 15);
        assert_eq!(prod.ai.window_minutes(), 60);
    }

    #[test]
    fn ai_config_maps_to_pipeline_settings() {
        let ai = AiConfig {
            timeout_secs: 0,
            strict_questions: true,
            question_model: "big".to_string(),
            ..AiConfig::default()
        };
        let pipeline = ai.pipeline_config();

        assert_eq!(pipeline.timeout, None);
        assert_eq!(pipeline.question_policy, QuestionShapePolicy::Strict);
        assert_eq!(pipeline.models.questions.as_str(), "big");
        assert_eq!(pipeline.models.explanation.as_str(), "gemini-2.0-flash-lite");
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.jwt_expires_days, 7);
        assert_eq!(config.bcrypt_cost, 12);
        assert_eq!(config.ai.timeout_secs, 60);
        assert_eq!(config.ai.max_attempts, 1);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }
}
