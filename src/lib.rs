pub mod error;
pub mod executor;
pub mod extract;
pub mod params;
pub mod retry;
pub mod sql;

pub use error::{VidqlError, VidqlResult};
pub use executor::QueryExecutor;
pub use extract::{OpenAiExtractor, ParameterExtractor};
pub use retry::RetryPolicy;

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Opaque configuration for the reasoning service, passed through by the
/// surrounding process. The crate itself exposes no CLI or file surface.
#[derive(Debug, Clone)]
pub struct VidqlConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_name: String,
}

impl Default for VidqlConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.z.ai/api/coding/paas/v4".to_string(),
            model_name: "glm-4.6".to_string(),
        }
    }
}

impl VidqlConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            config.api_key = api_key;
        }

        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(model_name) = std::env::var("MODEL_NAME") {
            config.model_name = model_name;
        }

        config
    }
}

/// One-question pipeline: extract parameters (with retry), validate them,
/// assemble the statement, execute it. Collaborators are injected so the
/// transport layer can share one pipeline across concurrent requests;
/// nothing here holds mutable state.
pub struct AnalyticsPipeline {
    extractor: Arc<dyn ParameterExtractor>,
    executor: Arc<dyn QueryExecutor>,
    retry: RetryPolicy,
}

impl AnalyticsPipeline {
    pub fn new(extractor: Arc<dyn ParameterExtractor>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            extractor,
            executor,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Answer a free-text analytics question with a single scalar.
    /// `None` means the query matched no data (SQL NULL).
    pub async fn answer(&self, question: &str) -> VidqlResult<Option<i64>> {
        self.answer_as_of(question, Utc::now().date_naive()).await
    }

    /// Like [`answer`](Self::answer), with the current date pinned.
    /// Relative dates in the question resolve against `today`.
    pub async fn answer_as_of(
        &self,
        question: &str,
        today: NaiveDate,
    ) -> VidqlResult<Option<i64>> {
        info!(question, "handling analytics question");

        let raw = retry::retry_extraction(&self.retry, || self.extractor.extract(question, today))
            .await?;
        debug!(?raw, "raw parameters extracted");

        let validated = params::validate(&raw)?;
        let query = sql::assemble(&validated)?;
        info!(sql = %query.text, binds = query.binds.len(), "assembled query");

        self.executor.fetch_scalar(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = VidqlConfig::default();
        assert_eq!(config.model_name, "glm-4.6");
        assert!(config.base_url.starts_with("https://"));
        assert!(config.api_key.is_empty());
    }
}
