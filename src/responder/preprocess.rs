use async_trait::async_trait;
use std::sync::Arc;

use super::RequestContext;

/// Caller-supplied step run before an error is answered.
///
/// `Ok(Some(e))` replaces the reported error with `e`, `Ok(None)` keeps it,
/// and `Err(e)` reports `e` in place of the original.
#[async_trait]
pub trait Preprocess: Send + Sync {
    async fn preprocess(
        &self,
        error: Arc<anyhow::Error>,
        ctx: &RequestContext,
    ) -> anyhow::Result<Option<anyhow::Error>>;
}
