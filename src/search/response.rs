//! Raw engine response and the result projector / 搜索响应与结果处理

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{Result, SearchError};
use crate::models::{HotelDocument, PageResult};
use super::query::SortKind;

/// `_search` response, reduced to the parts the projector reads / 原始搜索响应
#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchResult {
    #[serde(default)]
    pub took: u64,
    pub hits: RawHits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHits {
    pub total: RawTotal,
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTotal {
    pub value: u64,
    #[serde(default)]
    pub relation: TotalRelation,
}

/// `eq` when the count is exact; `track_total_hits` keeps it that way
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalRelation {
    #[default]
    Eq,
    Gte,
}

/// One hit / 单条命中
#[derive(Debug, Clone, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_source")]
    pub source: serde_json::Value,
    #[serde(default)]
    pub sort: Vec<serde_json::Value>,
    #[serde(default)]
    pub highlight: HashMap<String, Vec<String>>,
}

/// Project a raw result into a page of hotel documents / 处理搜索结果
///
/// Engine order is kept as is. A hit whose source fails to decode fails the
/// whole page.
pub fn project(raw: RawSearchResult, sort_kind: SortKind) -> Result<PageResult> {
    let total = raw.hits.total.value;
    if raw.hits.total.relation != TotalRelation::Eq {
        tracing::warn!("Index reported a lower-bound total ({}), not an exact count", total);
    }

    let hotels = raw
        .hits
        .hits
        .into_iter()
        .map(|hit| project_hit(hit, sort_kind))
        .collect::<Result<Vec<_>>>()?;

    Ok(PageResult { total, hotels })
}

fn project_hit(hit: RawHit, sort_kind: SortKind) -> Result<HotelDocument> {
    let RawHit { id, source, sort, mut highlight, .. } = hit;

    let mut doc: HotelDocument = serde_json::from_value(source).map_err(|source| {
        SearchError::Decode {
            id: id.unwrap_or_else(|| "<unknown>".to_string()),
            source,
        }
    })?;

    if sort_kind == SortKind::GeoDistanceKm {
        doc.distance = sort.first().and_then(sort_value_as_f64);
    }

    if let Some(fragment) = highlight.remove("name").and_then(|f| f.into_iter().next()) {
        doc.name = fragment;
    }

    Ok(doc)
}

/// Sort values come back as numbers, or strings for some field types / 排序值转数字
fn sort_value_as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
