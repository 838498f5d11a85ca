use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use hotel_search::models::{HotelDocument, PageResult};
use hotel_search::search::SearchCriteria;

use crate::api::ApiResponse;
use crate::db;
use crate::state::AppState;

/// POST /api/hotel/list - 酒店搜索
pub async fn search_hotels(
    State(state): State<Arc<AppState>>,
    Json(criteria): Json<SearchCriteria>,
) -> Json<ApiResponse<PageResult>> {
    match state.search.search(&criteria).await {
        Ok(page) => Json(ApiResponse::success(page)),
        Err(e) if e.is_transport() => {
            tracing::error!("Hotel search failed: {}", e);
            Json(ApiResponse::error_with_code(502, "搜索服务不可用"))
        }
        Err(e) => {
            tracing::error!("Hotel search failed: {}", e);
            Json(ApiResponse::error_with_code(500, &format!("搜索失败: {}", e)))
        }
    }
}

/// GET /api/hotels/:id - 按ID获取酒店文档
pub async fn get_hotel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<HotelDocument>> {
    match db::get_hotel(&state.db, id).await {
        Ok(Some(hotel)) => Json(ApiResponse::success(HotelDocument::from(hotel))),
        Ok(None) => Json(ApiResponse::error_with_code(404, "酒店不存在")),
        Err(e) => {
            tracing::error!("Failed to load hotel {}: {}", id, e);
            Json(ApiResponse::error_with_code(500, "数据库错误"))
        }
    }
}

/// GET /api/hotels - 全部酒店文档
pub async fn list_hotels(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<HotelDocument>>> {
    match db::list_hotels(&state.db).await {
        Ok(hotels) => Json(ApiResponse::success(
            hotels.into_iter().map(HotelDocument::from).collect(),
        )),
        Err(e) => {
            tracing::error!("Failed to list hotels: {}", e);
            Json(ApiResponse::error_with_code(500, "数据库错误"))
        }
    }
}
