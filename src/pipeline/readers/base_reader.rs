use async_trait::async_trait;

use crate::data_model::WorkItem;
use crate::error::Result;

/// Turns a work item into plain text.
#[async_trait]
pub trait BaseReader: Send + Sync {
    async fn read(&self, item: &WorkItem) -> Result<String>;
}
