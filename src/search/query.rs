//! Query compiler - turns search criteria into an index query body / 查询编译
//!
//! The body is modelled as typed structs that serialize to the engine's
//! query DSL, so the compiled query can be asserted on before it is sent.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::GeoPoint;
use super::criteria::{non_empty, SearchCriteria};

/// Aggregate text field the index fills from name, brand, business etc. / 聚合全文字段
pub const ALL_FIELD: &str = "all";
/// Advertised hotels get their relevance score multiplied by this / 广告加权倍数
pub const AD_BOOST_WEIGHT: f64 = 10.0;
const AD_FLAG_FIELD: &str = "isAD";
const LOCATION_FIELD: &str = "location";
const HIGHLIGHT_FIELD: &str = "name";

/// Query clause / 查询子句
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    MatchAll(MatchAll),
    Match(BTreeMap<String, String>),
    Term(BTreeMap<String, serde_json::Value>),
    Range(BTreeMap<String, RangeBounds>),
    Bool(BoolQuery),
    FunctionScore(Box<FunctionScoreQuery>),
}

impl Query {
    pub fn match_all() -> Self {
        Query::MatchAll(MatchAll {})
    }

    pub fn matches(field: &str, text: &str) -> Self {
        Query::Match(BTreeMap::from([(field.to_string(), text.to_string())]))
    }

    pub fn term(field: &str, value: impl Into<serde_json::Value>) -> Self {
        Query::Term(BTreeMap::from([(field.to_string(), value.into())]))
    }

    /// Inclusive on both ends / 闭区间
    pub fn range(field: &str, gte: i32, lte: i32) -> Self {
        Query::Range(BTreeMap::from([(
            field.to_string(),
            RangeBounds { gte: Some(gte), lte: Some(lte) },
        )]))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchAll {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<i32>,
}

/// `must` clauses are scored, `filter` clauses only restrict / 布尔查询
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoolQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Query>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Query>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionScoreQuery {
    pub query: Query,
    pub functions: Vec<ScoreFunction>,
    pub boost_mode: BoostMode,
}

/// Applies `weight` to documents matching `filter` / 算分函数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreFunction {
    pub filter: Query,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostMode {
    Multiply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DistanceUnit {
    #[serde(rename = "km")]
    Kilometers,
}

/// Sort directive / 排序子句
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SortClause {
    #[serde(rename = "_geo_distance")]
    GeoDistance(GeoDistanceSort),
}

/// Serializes as `{"location": "lat, lon", "order": "asc", "unit": "km"}` / 地理距离排序
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoDistanceSort {
    #[serde(flatten)]
    pub origin: BTreeMap<String, GeoPoint>,
    pub order: SortOrder,
    pub unit: DistanceUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub fields: BTreeMap<String, HighlightField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightField {
    pub require_field_match: bool,
}

/// Complete `_search` request body / 搜索请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchBody {
    pub query: Query,
    pub from: i64,
    pub size: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortClause>,
    pub highlight: Highlight,
    pub track_total_hits: bool,
}

/// What the primary sort of a compiled query means for its hits' sort values / 排序语义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    /// Engine default, score descending; hits carry no sort values
    Relevance,
    /// First sort value of each hit is its distance from the origin in km
    GeoDistanceKm,
}

/// Query body plus the sort tag the projector reads / 编译后的查询
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub body: SearchBody,
    pub sort_kind: SortKind,
}

/// Compile criteria into a query. Pure, never fails / 编译查询
pub fn compile(criteria: &SearchCriteria) -> CompiledQuery {
    let (sort, sort_kind) = match criteria.geo_origin {
        Some(origin) => (vec![geo_distance_sort(origin)], SortKind::GeoDistanceKm),
        None => (Vec::new(), SortKind::Relevance),
    };

    let body = SearchBody {
        query: boost_advertised(build_bool_query(criteria)),
        from: criteria.offset(),
        size: criteria.size,
        sort,
        highlight: name_highlight(),
        track_total_hits: true,
    };

    CompiledQuery { body, sort_kind }
}

fn build_bool_query(criteria: &SearchCriteria) -> BoolQuery {
    let mut bool_query = BoolQuery::default();

    bool_query.must.push(match non_empty(&criteria.keyword) {
        Some(keyword) => Query::matches(ALL_FIELD, keyword),
        None => Query::match_all(),
    });

    for (field, value) in [
        ("city", &criteria.city),
        ("brand", &criteria.brand),
        ("starName", &criteria.star_name),
    ] {
        if let Some(value) = non_empty(value) {
            bool_query.must.push(Query::term(field, value));
        }
    }

    // A single bound is ignored
    if let (Some(min), Some(max)) = (criteria.min_price, criteria.max_price) {
        bool_query.filter.push(Query::range("price", min, max));
    }

    bool_query
}

fn boost_advertised(bool_query: BoolQuery) -> Query {
    Query::FunctionScore(Box::new(FunctionScoreQuery {
        query: Query::Bool(bool_query),
        functions: vec![ScoreFunction {
            filter: Query::term(AD_FLAG_FIELD, true),
            weight: AD_BOOST_WEIGHT,
        }],
        boost_mode: BoostMode::Multiply,
    }))
}

fn geo_distance_sort(origin: GeoPoint) -> SortClause {
    SortClause::GeoDistance(GeoDistanceSort {
        origin: BTreeMap::from([(LOCATION_FIELD.to_string(), origin)]),
        order: SortOrder::Asc,
        unit: DistanceUnit::Kilometers,
    })
}

fn name_highlight() -> Highlight {
    Highlight {
        fields: BTreeMap::from([(
            HIGHLIGHT_FIELD.to_string(),
            HighlightField { require_field_match: false },
        )]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn inner_bool(compiled: &CompiledQuery) -> &BoolQuery {
        match &compiled.body.query {
            Query::FunctionScore(fs) => match &fs.query {
                Query::Bool(b) => b,
                other => panic!("expected bool query, got {:?}", other),
            },
            other => panic!("expected function_score, got {:?}", other),
        }
    }

    fn ad_boost() -> Value {
        json!([{ "filter": { "term": { "isAD": true } }, "weight": 10.0 }])
    }

    #[test]
    fn test_empty_criteria_matches_all() {
        let compiled = compile(&SearchCriteria::new());
        let body = serde_json::to_value(&compiled.body).unwrap();

        assert_eq!(
            body,
            json!({
                "query": {
                    "function_score": {
                        "query": { "bool": { "must": [ { "match_all": {} } ] } },
                        "functions": ad_boost(),
                        "boost_mode": "multiply"
                    }
                },
                "from": 0,
                "size": 10,
                "highlight": { "fields": { "name": { "require_field_match": false } } },
                "track_total_hits": true
            })
        );
        assert_eq!(compiled.sort_kind, SortKind::Relevance);
    }

    #[test]
    fn test_empty_strings_add_no_clauses() {
        let criteria = SearchCriteria::new()
            .with_keyword("")
            .with_city("")
            .with_brand("")
            .with_star_name("");
        let compiled = compile(&criteria);

        assert_eq!(inner_bool(&compiled).must, vec![Query::match_all()]);
        assert!(inner_bool(&compiled).filter.is_empty());
    }

    #[test]
    fn test_whitespace_values_are_sent_as_given() {
        let compiled = compile(&SearchCriteria::new().with_keyword(" ").with_city(" "));

        assert_eq!(
            inner_bool(&compiled).must,
            vec![Query::matches("all", " "), Query::term("city", " ")]
        );
    }

    #[test]
    fn test_keyword_and_terms() {
        let criteria = SearchCriteria::new()
            .with_keyword("如家")
            .with_city("上海")
            .with_brand("如家")
            .with_star_name("二钻");
        let body = serde_json::to_value(&compile(&criteria).body).unwrap();

        assert_eq!(
            body["query"]["function_score"]["query"]["bool"]["must"],
            json!([
                { "match": { "all": "如家" } },
                { "term": { "city": "上海" } },
                { "term": { "brand": "如家" } },
                { "term": { "starName": "二钻" } }
            ])
        );
    }

    #[test]
    fn test_price_range_needs_both_bounds() {
        let only_min = compile(&SearchCriteria::new().with_price_range(Some(200), None));
        assert!(inner_bool(&only_min).filter.is_empty());

        let only_max = compile(&SearchCriteria::new().with_price_range(None, Some(300)));
        assert!(inner_bool(&only_max).filter.is_empty());

        let both = compile(&SearchCriteria::new().with_price_range(Some(200), Some(300)));
        assert_eq!(inner_bool(&both).filter, vec![Query::range("price", 200, 300)]);

        let body = serde_json::to_value(&both.body).unwrap();
        assert_eq!(
            body["query"]["function_score"]["query"]["bool"]["filter"],
            json!([{ "range": { "price": { "gte": 200, "lte": 300 } } }])
        );
    }

    #[test]
    fn test_boost_always_present() {
        let variants = [
            SearchCriteria::new(),
            SearchCriteria::new().with_keyword("酒店"),
            SearchCriteria::new().with_city("北京").with_price_range(Some(1), Some(2)),
            SearchCriteria::new().with_geo_origin(GeoPoint::new(31.0, 121.0)),
        ];

        for criteria in &variants {
            let body = serde_json::to_value(&compile(criteria).body).unwrap();
            assert_eq!(body["query"]["function_score"]["functions"], ad_boost());
            assert_eq!(body["query"]["function_score"]["boost_mode"], json!("multiply"));
        }
    }

    #[test]
    fn test_geo_sort_toggling() {
        let with_origin = compile(&SearchCriteria::new().with_geo_origin(GeoPoint::new(31.03, 121.61)));
        assert_eq!(with_origin.sort_kind, SortKind::GeoDistanceKm);

        let body = serde_json::to_value(&with_origin.body).unwrap();
        assert_eq!(
            body["sort"],
            json!([{
                "_geo_distance": {
                    "location": "31.03, 121.61",
                    "order": "asc",
                    "unit": "km"
                }
            }])
        );

        let without = compile(&SearchCriteria::new().with_keyword("如家"));
        assert_eq!(without.sort_kind, SortKind::Relevance);
        let body = serde_json::to_value(&without.body).unwrap();
        assert!(body.get("sort").is_none());
    }

    #[test]
    fn test_pagination() {
        let compiled = compile(&SearchCriteria::new().with_page(3, 10));
        assert_eq!(compiled.body.from, 20);
        assert_eq!(compiled.body.size, 10);
    }

    #[test]
    fn test_page_zero_reaches_engine_unclamped() {
        let body = serde_json::to_value(&compile(&SearchCriteria::new().with_page(0, 10)).body).unwrap();
        assert_eq!(body["from"], json!(-10));
        assert_eq!(body["size"], json!(10));
    }
}
