use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

/// Geographic coordinate in the `"lat, lon"` form used by the `location` field / 地理坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl FromStr for GeoPoint {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SearchError::InvalidCriteria(format!("malformed geo point: {:?}", s));

        let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(invalid());
        }
        Ok(Self { lat, lon })
    }
}

impl TryFrom<String> for GeoPoint {
    type Error = SearchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GeoPoint> for String {
    fn from(point: GeoPoint) -> Self {
        point.to_string()
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

/// Hotel row in the relational store / 酒店数据库记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Hotel {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub price: i32,
    pub score: i32,
    pub brand: String,
    pub city: String,
    pub star_name: Option<String>,
    pub business: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub pic: Option<String>,
    pub is_ad: bool,
}

/// Hotel document as stored in the search index / 酒店索引文档
///
/// `distance` never comes from the source payload; it is filled in from the
/// geo-distance sort of the query that produced the hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDocument {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub price: i32,
    pub score: Option<i32>,
    pub brand: String,
    pub city: String,
    pub star_name: Option<String>,
    pub business: Option<String>,
    pub location: GeoPoint,
    pub pic: Option<String>,
    #[serde(rename = "isAD", default)]
    pub is_ad: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl From<Hotel> for HotelDocument {
    fn from(hotel: Hotel) -> Self {
        Self {
            id: hotel.id,
            name: hotel.name,
            address: hotel.address,
            price: hotel.price,
            score: Some(hotel.score),
            brand: hotel.brand,
            city: hotel.city,
            star_name: hotel.star_name,
            business: hotel.business,
            location: GeoPoint::new(hotel.latitude, hotel.longitude),
            pic: hotel.pic,
            is_ad: hotel.is_ad,
            distance: None,
        }
    }
}

/// One page of search results / 分页搜索结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// Total matches across all pages / 匹配总数
    pub total: u64,
    pub hotels: Vec<HotelDocument>,
}
