use std::sync::Arc;

use crate::core::config::{AppPaths, ConfigService};
use crate::core::security::{init_session_token, SessionToken};
use crate::llm::{LlmProvider, LlmService};
use crate::qa::QaService;
use crate::server::rate_limit::RequestLimiter;

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub session_token: SessionToken,
    pub qa: QaService,
    pub limiter: RequestLimiter,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// Discovers paths, resolves the session token and wires the QA service
    /// to the configured model provider.
    pub fn initialize() -> Result<Arc<Self>, InitializationError> {
        Self::initialize_in(Arc::new(AppPaths::new()))
    }

    /// Like [`initialize`](Self::initialize), with paths already discovered.
    pub fn initialize_in(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let session_token = init_session_token(&paths);
        let llm = LlmService::new(config.clone()).map_err(InitializationError::Llm)?;

        Self::from_parts(paths, session_token, Arc::new(llm))
    }

    /// Assemble state from explicit parts.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        session_token: SessionToken,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config.settings().map_err(InitializationError::Config)?;

        let limiter = RequestLimiter::new(&settings.rate_limit);
        if limiter.is_enabled() {
            tracing::info!(
                "Rate limiting RAG routes to {} requests per minute",
                limiter.requests_per_minute()
            );
        }
        if settings.llm.api_key.is_none() {
            tracing::warn!("No LLM API key configured; /api/rag/answer will return 503");
        }

        let qa = QaService::new(config.clone(), llm);

        Ok(Arc::new(AppState {
            paths,
            config,
            session_token,
            qa,
            limiter,
        }))
    }

    pub fn llm_configured(&self) -> bool {
        self.config
            .settings()
            .map(|settings| settings.llm.api_key.is_some())
            .unwrap_or(false)
    }
}
