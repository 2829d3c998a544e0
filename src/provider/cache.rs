//! TTL cache over a project context provider. Context changes slowly
//! (sprints, epics), so repeated analyses within one session reuse a fetch.

use crate::config::ContextCacheConfig;
use crate::error::Result;
use crate::model::ProjectContext;
use crate::provider::ProjectContextProvider;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use tracing::debug;

pub struct CachedContextProvider {
    inner: Arc<dyn ProjectContextProvider>,
    cache: Cache<String, ProjectContext>,
}

impl CachedContextProvider {
    pub fn new(inner: Arc<dyn ProjectContextProvider>, config: &ContextCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl())
            .build();
        Self { inner, cache }
    }

    /// Drop the cached context for one project, forcing a refetch.
    pub async fn invalidate(&self, project_key: &str) {
        self.cache.invalidate(project_key).await;
    }
}

#[async_trait]
impl ProjectContextProvider for CachedContextProvider {
    async fn get_context(&self, project_key: &str) -> Result<ProjectContext> {
        if let Some(context) = self.cache.get(project_key).await {
            debug!(project_key, "project context cache hit");
            return Ok(context);
        }

        let context = self.inner.get_context(project_key).await?;
        self.cache
            .insert(project_key.to_string(), context.clone())
            .await;
        debug!(project_key, epics = context.epics.len(), "project context cached");
        Ok(context)
    }
}
