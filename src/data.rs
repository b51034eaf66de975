use sqlx::{Row, SqlitePool};

/// One SQLite table keyed by a text `id` column.
#[async_trait::async_trait]
pub trait Table {
    type Record<'a>;

    fn get_name(&self) -> &str;
    fn get_pool(&self) -> &SqlitePool;

    /// Creates the table unless the database already has it.
    async fn create(&self) -> Result<(), sqlx::Error>;
    async fn insert<'a>(&self, record: Self::Record<'a>) -> Result<(), sqlx::Error>;

    /// Returns the number of deleted rows.
    async fn delete_all(&self) -> Result<u64, sqlx::Error> {
        let query = format!(r#"DELETE FROM {}"#, self.get_name());
        Ok(sqlx::query(&query)
            .execute(self.get_pool())
            .await?
            .rows_affected())
    }

    async fn count(&self) -> Result<u32, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", self.get_name());
        Ok(sqlx::query(&query)
            .fetch_one(self.get_pool())
            .await?
            .try_get(0)?)
    }
}
