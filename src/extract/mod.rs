pub mod openai;

pub use openai::OpenAiExtractor;

use crate::error::VidqlResult;
use crate::params::RawParameters;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Boundary to the external reasoning service. Injected into the pipeline
/// so tests can script extractions without a network.
#[async_trait]
pub trait ParameterExtractor: Send + Sync {
    /// Extract structured query parameters from a free-text question.
    /// `today` anchors relative dates like "November 28" to a year.
    async fn extract(&self, question: &str, today: NaiveDate) -> VidqlResult<RawParameters>;
}
