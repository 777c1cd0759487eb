use anyhow::Result;
use async_trait::async_trait;

/// Transport collaborator. The engine only consumes already-fetched payload
/// text; how it comes off the wire is the caller's concern.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}
