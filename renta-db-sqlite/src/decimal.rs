use std::str::FromStr;

use renta_core::RepositoryError;
use rust_decimal::Decimal;
use sqlx::{Row, TypeInfo, ValueRef};

/// Read a decimal column. Amounts are written as TEXT; INTEGER and REAL are
/// accepted for rows edited by hand.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Err(RepositoryError::Database(format!(
            "Unexpected NULL in column '{}'",
            column
        )));
    }

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "TEXT" => {
            let text: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            Decimal::from_str(text.trim()).map_err(|e| {
                RepositoryError::Database(format!(
                    "Invalid decimal '{}' in column '{}': {}",
                    text, column, e
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        _ => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            type_name, column
        ))),
    }
}

/// Exact text form for storage; keeps the scale (`1916.00` stays `1916.00`).
pub fn decimal_to_text(d: Decimal) -> String {
    d.to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

    use super::*;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        sqlx::query(
            "CREATE TABLE amounts (
                id INTEGER PRIMARY KEY,
                text_value TEXT,
                int_value INTEGER,
                real_value REAL,
                null_value TEXT
            )",
        )
        .execute(&pool)
        .await
        .expect("Failed to create test table");

        pool
    }

    async fn fetch(
        pool: &SqlitePool,
        insert: &str,
        column: &str,
    ) -> Result<Decimal, RepositoryError> {
        sqlx::query(insert)
            .execute(pool)
            .await
            .expect("Failed to insert test data");
        let row = sqlx::query(&format!("SELECT {column} FROM amounts WHERE id = 1"))
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row");
        get_decimal(&row, column)
    }

    #[tokio::test]
    async fn reads_exact_text_decimal() {
        let pool = setup_test_db().await;

        let result = fetch(
            &pool,
            "INSERT INTO amounts (id, text_value) VALUES (1, '7999.992')",
            "text_value",
        )
        .await;

        assert_eq!(result, Ok(dec!(7999.992)));
    }

    #[tokio::test]
    async fn reads_integer_column() {
        let pool = setup_test_db().await;

        let result = fetch(
            &pool,
            "INSERT INTO amounts (id, int_value) VALUES (1, 36050)",
            "int_value",
        )
        .await;

        assert_eq!(result, Ok(dec!(36050)));
    }

    #[tokio::test]
    async fn reads_real_column() {
        let pool = setup_test_db().await;

        let result = fetch(
            &pool,
            "INSERT INTO amounts (id, real_value) VALUES (1, 1916.5)",
            "real_value",
        )
        .await;

        assert_eq!(result, Ok(dec!(1916.5)));
    }

    #[tokio::test]
    async fn rejects_non_numeric_text() {
        let pool = setup_test_db().await;

        let result = fetch(
            &pool,
            "INSERT INTO amounts (id, text_value) VALUES (1, 'mil soles')",
            "text_value",
        )
        .await;

        assert!(matches!(
            result,
            Err(RepositoryError::Database(msg)) if msg.starts_with("Invalid decimal 'mil soles'")
        ));
    }

    #[tokio::test]
    async fn rejects_null() {
        let pool = setup_test_db().await;

        let result = fetch(
            &pool,
            "INSERT INTO amounts (id) VALUES (1)",
            "null_value",
        )
        .await;

        assert_eq!(
            result,
            Err(RepositoryError::Database(
                "Unexpected NULL in column 'null_value'".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn missing_column_is_reported() {
        let pool = setup_test_db().await;

        let result = fetch(
            &pool,
            "INSERT INTO amounts (id, text_value) VALUES (1, '1')",
            "id",
        )
        .await;
        assert_eq!(result, Ok(dec!(1)));

        let row = sqlx::query("SELECT id FROM amounts WHERE id = 1")
            .fetch_one(&pool)
            .await
            .expect("Failed to fetch row");
        assert!(matches!(
            get_decimal(&row, "nope"),
            Err(RepositoryError::Database(msg)) if msg.starts_with("Column 'nope' not found:")
        ));
    }

    #[test]
    fn decimal_to_text_keeps_scale() {
        assert_eq!(decimal_to_text(dec!(1916.00)), "1916.00");
        assert_eq!(decimal_to_text(dec!(-0.5)), "-0.5");
    }
}
