use anyhow::Result;
use sqlx::SqlitePool;

use hotel_search::models::Hotel;

const HOTEL_COLUMNS: &str =
    "id, name, address, price, score, brand, city, star_name, business, latitude, longitude, pic, is_ad";

/// Run database migrations / 运行数据库迁移
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tb_hotel (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            address TEXT NOT NULL,
            price INTEGER NOT NULL,
            score INTEGER NOT NULL DEFAULT 0,
            brand TEXT NOT NULL,
            city TEXT NOT NULL,
            star_name TEXT,
            business TEXT,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            pic TEXT,
            is_ad INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tb_hotel_city ON tb_hotel(city)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Fetch one hotel row / 按ID查询酒店
pub async fn get_hotel(pool: &SqlitePool, id: i64) -> Result<Option<Hotel>> {
    let hotel = sqlx::query_as::<_, Hotel>(&format!("SELECT {} FROM tb_hotel WHERE id = ?", HOTEL_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(hotel)
}

/// List every hotel row, ordered by id / 查询全部酒店
pub async fn list_hotels(pool: &SqlitePool) -> Result<Vec<Hotel>> {
    let hotels = sqlx::query_as::<_, Hotel>(&format!("SELECT {} FROM tb_hotel ORDER BY id", HOTEL_COLUMNS))
        .fetch_all(pool)
        .await?;
    Ok(hotels)
}
