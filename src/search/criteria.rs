//! Search criteria - what a caller asks for / 搜索条件

use serde::{Deserialize, Deserializer};

use crate::models::GeoPoint;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Hotel search criteria / 酒店搜索条件
///
/// Every field except paging is optional, and an empty string counts as absent.
/// Paging is not validated; out-of-range values reach the engine as given.
/// Deserializes from the request body of `POST /api/hotel/list`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    /// Free-text keyword / 关键字
    #[serde(rename = "key", default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    /// Star rating, e.g. "五星级" / 星级
    #[serde(default)]
    pub star_name: Option<String>,
    #[serde(default)]
    pub min_price: Option<i32>,
    #[serde(default)]
    pub max_price: Option<i32>,
    /// Origin for distance sorting / 地理位置
    #[serde(rename = "location", default, deserialize_with = "blank_geo_point")]
    pub geo_origin: Option<GeoPoint>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

fn default_page() -> i64 { DEFAULT_PAGE }
fn default_page_size() -> i64 { DEFAULT_PAGE_SIZE }

/// `null`, `""` and whitespace all mean "no origin" / 空字符串视为未设置
fn blank_geo_point<'de, D>(deserializer: D) -> Result<Option<GeoPoint>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            keyword: None,
            city: None,
            brand: None,
            star_name: None,
            min_price: None,
            max_price: None,
            geo_origin: None,
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_star_name(mut self, star_name: impl Into<String>) -> Self {
        self.star_name = Some(star_name.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_geo_origin(mut self, origin: GeoPoint) -> Self {
        self.geo_origin = Some(origin);
        self
    }

    pub fn with_page(mut self, page: i64, size: i64) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    /// Index of the first hit on the requested page, `(page - 1) * size` / 分页起始偏移
    ///
    /// Negative for page 0 or below; saturates instead of overflowing.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }
}

/// The value unless it is absent or `""` / 非空时返回
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
