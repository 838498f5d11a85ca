use sqlx::SqlitePool;
use hotel_search::search::HotelSearchService;

/// Shared handler state / 共享状态
///
/// Built once in `main`; the search service owns the index client for the
/// lifetime of the server.
pub struct AppState {
    pub db: SqlitePool,
    pub search: HotelSearchService,
}
