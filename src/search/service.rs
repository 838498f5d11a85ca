//! Hotel search service - compile, query, project / 酒店搜索服务

use std::sync::Arc;

use crate::error::Result;
use crate::models::PageResult;
use super::client::IndexClient;
use super::criteria::SearchCriteria;
use super::query::compile;
use super::response::project;

pub const DEFAULT_INDEX: &str = "hotel";

/// Search orchestrator / 搜索编排
///
/// Holds no per-request state; the index client is handed in at construction.
#[derive(Clone)]
pub struct HotelSearchService {
    client: Arc<dyn IndexClient>,
    index: String,
}

impl HotelSearchService {
    pub fn new(client: Arc<dyn IndexClient>, index: impl Into<String>) -> Self {
        Self { client, index: index.into() }
    }

    /// Run one search. Engine and decode failures are returned, never retried / 搜索
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<PageResult> {
        let compiled = compile(criteria);
        tracing::debug!(
            "Searching index {}: from={} size={} sort={:?}",
            self.index,
            compiled.body.from,
            compiled.body.size,
            compiled.sort_kind
        );

        let raw = match self.client.search(&self.index, &compiled.body).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Index search failed on {}: {}", self.index, e);
                return Err(e);
            }
        };
        tracing::debug!("Index answered in {}ms, total={}", raw.took, raw.hits.total.value);

        project(raw, compiled.sort_kind)
    }
}
