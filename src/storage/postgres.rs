use crate::{
    config::DatabaseConfig,
    error::{Result, StudioError},
    models::{HistoryItem, HISTORY_COLUMN_COUNT},
    storage::traits::HistoryStore,
};

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use tokio::sync::OnceCell;
use tokio_postgres::{types::ToSql, NoTls, Row};

const COLUMNS: &str =
    "id, collection_id, created_at, prompt, style, model_id, aspect, seed, width, height, image_url";
const COLUMN_COUNT: usize = HISTORY_COLUMN_COUNT;

pub struct PostgresHistoryStore {
    pool: Pool,
    schema: OnceCell<()>,
}

impl PostgresHistoryStore {
    /// Builds the pool without connecting; the first query opens a connection
    /// and creates the schema.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .url
            .parse()
            .map_err(|e| StudioError::ConfigError(format!("Invalid DATABASE_URL: {}", e)))?;
        if let Some(token) = &config.auth_token {
            pg_config.password(token);
        }

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| StudioError::ConfigError(format!("Failed to create pool: {}", e)))?;

        Ok(Self {
            pool,
            schema: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<Object> {
        let client = self.pool.get().await.map_err(|e| {
            StudioError::StorageError(format!("Failed to get connection: {}", e))
        })?;
        self.schema
            .get_or_try_init(|| initialize_schema(&client))
            .await?;
        Ok(client)
    }
}

async fn initialize_schema(client: &Object) -> Result<()> {
    client
        .execute(
            "CREATE TABLE IF NOT EXISTS history_items (
                id TEXT PRIMARY KEY,
                collection_id TEXT NOT NULL,
                created_at BIGINT NOT NULL,
                prompt TEXT,
                style TEXT,
                model_id TEXT,
                aspect TEXT,
                seed BIGINT,
                width INTEGER,
                height INTEGER,
                image_url TEXT
            )",
            &[],
        )
        .await
        .map_err(|e| {
            StudioError::StorageError(format!("Failed to create history_items table: {}", e))
        })?;

    client
        .execute(
            "CREATE INDEX IF NOT EXISTS idx_history_collection_created
             ON history_items(collection_id, created_at DESC)",
            &[],
        )
        .await
        .map_err(|e| {
            StudioError::StorageError(format!("Failed to create collection index: {}", e))
        })?;

    log::info!("PostgreSQL history schema initialized");
    Ok(())
}

fn insert_statement(rows: usize) -> String {
    let values: Vec<String> = (0..rows)
        .map(|row| {
            let slots: Vec<String> = (1..=COLUMN_COUNT)
                .map(|col| format!("${}", row * COLUMN_COUNT + col))
                .collect();
            format!("({})", slots.join(", "))
        })
        .collect();

    format!(
        "INSERT INTO history_items ({}) VALUES {}",
        COLUMNS,
        values.join(", ")
    )
}

fn item_from_row(row: &Row) -> HistoryItem {
    HistoryItem {
        id: row.get("id"),
        collection_id: row.get("collection_id"),
        created_at: row.get("created_at"),
        prompt: row.get::<_, Option<String>>("prompt").unwrap_or_default(),
        style: row.get("style"),
        model_id: row.get::<_, Option<String>>("model_id").unwrap_or_default(),
        aspect: row
            .get::<_, Option<String>>("aspect")
            .unwrap_or_else(|| "1:1".to_string()),
        seed: row.get::<_, Option<i64>>("seed").unwrap_or(0),
        width: row.get::<_, Option<i32>>("width").unwrap_or(0),
        height: row.get::<_, Option<i32>>("height").unwrap_or(0),
        image_url: row.get::<_, Option<String>>("image_url").unwrap_or_default(),
    }
}

#[async_trait]
impl HistoryStore for PostgresHistoryStore {
    async fn insert_batch(&self, items: Vec<HistoryItem>) -> Result<usize> {
        if items.is_empty() {
            return Ok(0);
        }
        let client = self.connection().await?;

        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(items.len() * COLUMN_COUNT);
        for item in &items {
            params.push(&item.id);
            params.push(&item.collection_id);
            params.push(&item.created_at);
            params.push(&item.prompt);
            params.push(&item.style);
            params.push(&item.model_id);
            params.push(&item.aspect);
            params.push(&item.seed);
            params.push(&item.width);
            params.push(&item.height);
            params.push(&item.image_url);
        }

        let stmt = client
            .prepare(&insert_statement(items.len()))
            .await
            .map_err(|e| {
                StudioError::StorageError(format!("Failed to prepare insert statement: {}", e))
            })?;

        let inserted = client.execute(&stmt, &params).await.map_err(|e| {
            StudioError::StorageError(format!("Failed to insert history items: {}", e))
        })?;

        log::debug!("Inserted {} history rows", inserted);
        Ok(inserted as usize)
    }

    async fn list(&self, collection_id: &str, limit: usize) -> Result<Vec<HistoryItem>> {
        let client = self.connection().await?;
        let limit = limit as i64;

        let stmt = client
            .prepare(&format!(
                "SELECT {} FROM history_items
                 WHERE collection_id = $1
                 ORDER BY created_at DESC, id DESC
                 LIMIT $2",
                COLUMNS
            ))
            .await
            .map_err(|e| {
                StudioError::StorageError(format!("Failed to prepare list statement: {}", e))
            })?;

        let rows = client
            .query(&stmt, &[&collection_id, &limit])
            .await
            .map_err(|e| StudioError::StorageError(format!("Failed to list history: {}", e)))?;

        Ok(rows.iter().map(item_from_row).collect())
    }

    async fn health_check(&self) -> Result<bool> {
        let client = self.connection().await?;
        let row = client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| StudioError::StorageError(format!("Health check failed: {}", e)))?;
        Ok(row.get::<_, i32>(0) == 1)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HISTORY_BATCH_LIMIT, HISTORY_READ_LIMIT};
    use uuid::Uuid;

    #[test]
    fn test_insert_statement_placeholders() {
        let sql = insert_statement(2);
        assert!(sql.starts_with("INSERT INTO history_items (id, collection_id,"));
        assert!(sql.contains("($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"));
        assert!(sql.ends_with("($12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)"));
    }

    #[test]
    fn test_pool_builds_without_connecting() {
        let config = DatabaseConfig::new("postgres://user@localhost:5432/fluxstudio")
            .with_auth_token("token");
        let store = PostgresHistoryStore::new(&config).unwrap();
        assert_eq!(store.backend_name(), "postgres");
    }

    #[test]
    fn test_malformed_url_is_config_error() {
        let config = DatabaseConfig::new("postgres://user@localhost:notaport/fluxstudio");
        let err = PostgresHistoryStore::new(&config).err().unwrap();
        assert!(matches!(err, StudioError::ConfigError(_)));
    }

    #[test]
    fn test_widest_batch_fits_bind_limit() {
        let sql = insert_statement(HISTORY_BATCH_LIMIT);
        let last = HISTORY_BATCH_LIMIT * COLUMN_COUNT;
        assert!(last <= u16::MAX as usize);
        assert!(sql.ends_with(&format!("${})", last)));
    }

    fn sample_item(collection_id: &str, id: String, created_at: i64) -> HistoryItem {
        HistoryItem {
            id,
            collection_id: collection_id.to_string(),
            created_at,
            prompt: "a fox".to_string(),
            style: Some("Cinematic".to_string()),
            model_id: "flux-dev".to_string(),
            aspect: "16:9".to_string(),
            seed: 42,
            width: 1024,
            height: 576,
            image_url: "https://a/fox.png".to_string(),
        }
    }

    /// Runs against a real server: `DATABASE_URL=postgres://… cargo test -- --ignored`.
    #[tokio::test]
    #[ignore = "needs a PostgreSQL server in DATABASE_URL"]
    async fn test_database_round_trip() {
        let Some(config) = DatabaseConfig::from_env() else {
            return;
        };
        let store = PostgresHistoryStore::new(&config).unwrap();
        let collection = format!("t{}", Uuid::new_v4().simple());

        // First call creates the schema.
        assert!(store.list(&collection, HISTORY_READ_LIMIT).await.unwrap().is_empty());

        // Two rows share each timestamp so ties fall back to id order.
        let items: Vec<HistoryItem> = (0..210)
            .map(|i| sample_item(&collection, format!("{}-{:03}", collection, i), 1_000 + i / 2))
            .collect();
        assert_eq!(store.insert_batch(items).await.unwrap(), 210);

        let client = store.connection().await.unwrap();
        let null_id = format!("{}-null", collection);
        client
            .execute(
                "INSERT INTO history_items (id, collection_id, created_at) VALUES ($1, $2, $3)",
                &[&null_id, &collection, &10_000_i64],
            )
            .await
            .unwrap();

        let listed = store.list(&collection, HISTORY_READ_LIMIT).await.unwrap();
        assert_eq!(listed.len(), HISTORY_READ_LIMIT);

        let newest = &listed[0];
        assert_eq!(newest.id, null_id);
        assert_eq!(newest.prompt, "");
        assert_eq!(newest.style, None);
        assert_eq!(newest.model_id, "");
        assert_eq!(newest.aspect, "1:1");
        assert_eq!((newest.seed, newest.width, newest.height), (0, 0, 0));
        assert_eq!(newest.image_url, "");

        assert_eq!(listed[1].id, format!("{}-209", collection));
        assert_eq!(listed[2].id, format!("{}-208", collection));
        assert_eq!(listed[1].style.as_deref(), Some("Cinematic"));
        for pair in listed.windows(2) {
            assert!((pair[0].created_at, &pair[0].id) > (pair[1].created_at, &pair[1].id));
        }

        client
            .execute("DELETE FROM history_items WHERE collection_id = $1", &[&collection])
            .await
            .unwrap();
    }
}
