//! Hotel search - query compilation and result projection / 酒店搜索
//!
//! Flow / 流程：
//! - `criteria` → `query::compile` → index body + sort tag
//! - `client::IndexClient` executes the body against the engine
//! - `response::project` turns the raw hits back into `HotelDocument`s
//!
//! Only `client` performs I/O; everything else is pure.

pub mod client;
pub mod criteria;
pub mod query;
pub mod response;
pub mod service;

pub use client::{ElasticsearchClient, IndexClient};
pub use criteria::SearchCriteria;
pub use query::{compile, CompiledQuery, SearchBody, SortKind};
pub use response::{project, RawSearchResult};
pub use service::HotelSearchService;
