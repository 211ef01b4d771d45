use crate::error::VidqlResult;
use crate::sql::AssembledQuery;
use async_trait::async_trait;

/// Downstream seam to the database collaborator that runs the assembled
/// statement. Implementations own their connection pooling and must be
/// safe for concurrent independent calls; pool exhaustion surfaces as an
/// execution error.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute one read-only aggregate and return its single scalar.
    /// `None` maps a SQL NULL. Execution failures are fatal for the
    /// request; the core never retries them, since the statement is
    /// deterministic given its input.
    async fn fetch_scalar(&self, query: &AssembledQuery) -> VidqlResult<Option<i64>>;
}
