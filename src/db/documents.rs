//! JSON document store
//!
//! Schemaless documents grouped by collection name, stored one row each in
//! the `documents` table. Supports lookup by id, ordered listing with an
//! optional limit, equality queries on a top-level field and field-level
//! updates (set, array union/remove, patch/remove of array elements matched
//! by key).
//!
//! Field updates are applied read-modify-write with a compare-and-swap on
//! the stored body, so two concurrent updates of the same document never
//! lose each other's changes.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// Attempts before an update gives up on a contended document.
const MAX_UPDATE_ATTEMPTS: usize = 8;

/// A stored document. `data` never contains the `id` key.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Deserialize into a typed model; the document id is exposed as `id`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut data = self.data.clone();
        if let Value::Object(map) = &mut data {
            map.insert("id".to_string(), Value::String(self.id.clone()));
        }
        serde_json::from_value(data)
            .with_context(|| format!("Malformed document '{}'", self.id))
    }
}

/// Serialize a model into a document body, dropping any `id` key.
pub fn to_body<T: Serialize>(value: &T) -> Result<Value> {
    let mut body = serde_json::to_value(value).context("Failed to serialize document")?;
    match &mut body {
        Value::Object(map) => {
            map.remove("id");
        }
        _ => bail!("Document body must be a JSON object"),
    }
    Ok(body)
}

/// A single field-level mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Set a top-level field
    Set { field: String, value: Value },
    /// Append each value not already present in the array
    ArrayUnion { field: String, values: Vec<Value> },
    /// Remove every element equal to one of the values
    ArrayRemove { field: String, values: Vec<Value> },
    /// Merge `patch` into every object element whose `key` equals `equals`
    ArrayPatchWhere {
        field: String,
        key: String,
        equals: Value,
        patch: Map<String, Value>,
    },
    /// Remove every object element whose `key` equals `equals`
    ArrayRemoveWhere {
        field: String,
        key: String,
        equals: Value,
    },
}

impl FieldUpdate {
    pub fn set(field: &str, value: Value) -> Self {
        Self::Set {
            field: field.to_string(),
            value,
        }
    }

    pub fn array_union(field: &str, values: Vec<Value>) -> Self {
        Self::ArrayUnion {
            field: field.to_string(),
            values,
        }
    }

    pub fn array_remove(field: &str, values: Vec<Value>) -> Self {
        Self::ArrayRemove {
            field: field.to_string(),
            values,
        }
    }

    pub fn array_patch_where(field: &str, key: &str, equals: Value, patch: Map<String, Value>) -> Self {
        Self::ArrayPatchWhere {
            field: field.to_string(),
            key: key.to_string(),
            equals,
            patch,
        }
    }

    pub fn array_remove_where(field: &str, key: &str, equals: Value) -> Self {
        Self::ArrayRemoveWhere {
            field: field.to_string(),
            key: key.to_string(),
            equals,
        }
    }

    fn field(&self) -> &str {
        match self {
            Self::Set { field, .. }
            | Self::ArrayUnion { field, .. }
            | Self::ArrayRemove { field, .. }
            | Self::ArrayPatchWhere { field, .. }
            | Self::ArrayRemoveWhere { field, .. } => field,
        }
    }
}

/// Apply updates to a document body in order.
///
/// Array operations on a missing field start from an empty array; an array
/// union on a non-array field replaces it.
pub fn apply_updates(data: &mut Value, updates: &[FieldUpdate]) -> Result<()> {
    let map = data
        .as_object_mut()
        .ok_or_else(|| anyhow!("Document body must be a JSON object"))?;

    for update in updates {
        validate_field_name(update.field())?;
        match update {
            FieldUpdate::Set { field, value } => {
                map.insert(field.clone(), value.clone());
            }
            FieldUpdate::ArrayUnion { field, values } => {
                let slot = map
                    .entry(field.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !slot.is_array() {
                    *slot = Value::Array(Vec::new());
                }
                if let Value::Array(items) = slot {
                    for value in values {
                        if !items.contains(value) {
                            items.push(value.clone());
                        }
                    }
                }
            }
            FieldUpdate::ArrayRemove { field, values } => {
                if let Some(Value::Array(items)) = map.get_mut(field) {
                    items.retain(|item| !values.contains(item));
                }
            }
            FieldUpdate::ArrayPatchWhere {
                field,
                key,
                equals,
                patch,
            } => {
                if let Some(Value::Array(items)) = map.get_mut(field) {
                    for item in items.iter_mut() {
                        if let Value::Object(element) = item {
                            if element.get(key) == Some(equals) {
                                for (k, v) in patch {
                                    element.insert(k.clone(), v.clone());
                                }
                            }
                        }
                    }
                }
            }
            FieldUpdate::ArrayRemoveWhere { field, key, equals } => {
                if let Some(Value::Array(items)) = map.get_mut(field) {
                    items.retain(|item| item.get(key) != Some(equals));
                }
            }
        }
    }

    Ok(())
}

fn validate_field_name(field: &str) -> Result<()> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("Invalid field name '{}'", field);
    }
    Ok(())
}

/// Collection-oriented document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Documents in insertion order, optionally capped at `limit`
    async fn list(&self, collection: &str, limit: Option<usize>) -> Result<Vec<Document>>;

    /// Documents whose top-level `field` equals `value`, in insertion order
    async fn find_by_field(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>>;

    /// Insert with a generated id
    async fn insert(&self, collection: &str, data: Value) -> Result<Document>;

    /// Create or replace the document with the given id
    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<Document>;

    /// Apply field updates; `None` if the document doesn't exist
    async fn update(&self, collection: &str, id: &str, updates: &[FieldUpdate]) -> Result<Option<Document>>;

    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;
}

pub type DynDocumentStore = Arc<dyn DocumentStore>;

/// SQLx-backed document store
pub struct SqlxDocumentStore {
    pool: DynDatabasePool,
}

impl SqlxDocumentStore {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> DynDocumentStore {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl DocumentStore for SqlxDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.sqlite()?, collection, id).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.mysql()?, collection, id).await,
        }
    }

    async fn list(&self, collection: &str, limit: Option<usize>) -> Result<Vec<Document>> {
        // -1 means no limit
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.sqlite()?, collection, limit).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.mysql()?, collection, limit).await,
        }
    }

    async fn find_by_field(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>> {
        validate_field_name(field)?;
        let path = format!("$.{}", field);
        let encoded = serde_json::to_string(value)?;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_sqlite(self.pool.sqlite()?, collection, &path, &encoded).await
            }
            DatabaseDriver::Mysql => {
                find_mysql(self.pool.mysql()?, collection, &path, &encoded).await
            }
        }
    }

    async fn insert(&self, collection: &str, data: Value) -> Result<Document> {
        let id = Uuid::new_v4().simple().to_string();
        let data = strip_id(data)?;
        let now = Utc::now();
        let body = data.to_string();

        let sql = "INSERT INTO documents (collection, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(collection)
                    .bind(&id)
                    .bind(&body)
                    .bind(now)
                    .bind(now)
                    .execute(self.pool.sqlite()?)
                    .await
                    .map(|r| r.rows_affected())
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(collection)
                    .bind(&id)
                    .bind(&body)
                    .bind(now)
                    .bind(now)
                    .execute(self.pool.mysql()?)
                    .await
                    .map(|r| r.rows_affected())
            }
        }
        .with_context(|| format!("Failed to insert document into '{}'", collection))?;

        Ok(Document {
            id,
            data,
            created_at: now,
            updated_at: now,
        })
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<Document> {
        let data = strip_id(data)?;
        let now = Utc::now();
        let body = data.to_string();

        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(
                    "INSERT INTO documents (collection, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?) \
                     ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                )
                .bind(collection)
                .bind(id)
                .bind(&body)
                .bind(now)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .map(|r| r.rows_affected())
            }
            DatabaseDriver::Mysql => {
                sqlx::query(
                    "INSERT INTO documents (collection, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?) \
                     ON DUPLICATE KEY UPDATE data = VALUES(data), updated_at = VALUES(updated_at)",
                )
                .bind(collection)
                .bind(id)
                .bind(&body)
                .bind(now)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .map(|r| r.rows_affected())
            }
        }
        .with_context(|| format!("Failed to write document '{}/{}'", collection, id))?;

        self.get(collection, id)
            .await?
            .ok_or_else(|| anyhow!("Document '{}/{}' vanished after write", collection, id))
    }

    async fn update(&self, collection: &str, id: &str, updates: &[FieldUpdate]) -> Result<Option<Document>> {
        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let Some(current) = self.get(collection, id).await? else {
                return Ok(None);
            };

            let old_body = current.data.to_string();
            let mut data = current.data.clone();
            apply_updates(&mut data, updates)?;
            let new_body = data.to_string();
            let now = Utc::now();

            let sql = "UPDATE documents SET data = ?, updated_at = ? WHERE collection = ? AND id = ? AND data = ?";
            let result = match self.pool.driver() {
                DatabaseDriver::Sqlite => {
                    sqlx::query(sql)
                        .bind(&new_body)
                        .bind(now)
                        .bind(collection)
                        .bind(id)
                        .bind(&old_body)
                        .execute(self.pool.sqlite()?)
                        .await
                        .map(|r| r.rows_affected())
                }
                DatabaseDriver::Mysql => {
                    sqlx::query(sql)
                        .bind(&new_body)
                        .bind(now)
                        .bind(collection)
                        .bind(id)
                        .bind(&old_body)
                        .execute(self.pool.mysql()?)
                        .await
                        .map(|r| r.rows_affected())
                }
            }
            .with_context(|| format!("Failed to update document '{}/{}'", collection, id))?;

            if result > 0 {
                return Ok(Some(Document {
                    id: current.id,
                    data,
                    created_at: current.created_at,
                    updated_at: now,
                }));
            }
            tracing::debug!("Concurrent write on {}/{}, retrying update", collection, id);
        }

        bail!(
            "Document '{}/{}' is too contended to update",
            collection,
            id
        )
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let sql = "DELETE FROM documents WHERE collection = ? AND id = ?";
        let result = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(collection)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .map(|r| r.rows_affected())
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(collection)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .map(|r| r.rows_affected())
            }
        }
        .with_context(|| format!("Failed to delete document '{}/{}'", collection, id))?;

        Ok(result > 0)
    }
}

fn strip_id(data: Value) -> Result<Value> {
    match data {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(Value::Object(map))
        }
        _ => bail!("Document body must be a JSON object"),
    }
}

fn row_to_document(id: String, body: String, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Result<Document> {
    let data = serde_json::from_str(&body)
        .with_context(|| format!("Stored document '{}' is not valid JSON", id))?;
    Ok(Document {
        id,
        data,
        created_at,
        updated_at,
    })
}

// ============================================================================
// SQLite implementation
// ============================================================================

fn sqlite_row(row: &sqlx::sqlite::SqliteRow) -> Result<Document> {
    row_to_document(
        row.get("id"),
        row.get("data"),
        row.get("created_at"),
        row.get("updated_at"),
    )
}

async fn get_sqlite(pool: &SqlitePool, collection: &str, id: &str) -> Result<Option<Document>> {
    let row = sqlx::query(
        "SELECT id, data, created_at, updated_at FROM documents WHERE collection = ? AND id = ?",
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to read document '{}/{}'", collection, id))?;

    row.as_ref().map(sqlite_row).transpose()
}

async fn list_sqlite(pool: &SqlitePool, collection: &str, limit: i64) -> Result<Vec<Document>> {
    // LIMIT -1 means no limit in SQLite.
    let rows = sqlx::query(
        "SELECT id, data, created_at, updated_at FROM documents WHERE collection = ? ORDER BY seq LIMIT ?",
    )
    .bind(collection)
    .bind(limit)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list collection '{}'", collection))?;

    rows.iter().map(sqlite_row).collect()
}

async fn find_sqlite(pool: &SqlitePool, collection: &str, path: &str, encoded: &str) -> Result<Vec<Document>> {
    let rows = sqlx::query(
        "SELECT id, data, created_at, updated_at FROM documents \
         WHERE collection = ? AND json_extract(data, ?) = json_extract(?, '$') ORDER BY seq",
    )
    .bind(collection)
    .bind(path)
    .bind(encoded)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to query collection '{}'", collection))?;

    rows.iter().map(sqlite_row).collect()
}

// ============================================================================
// MySQL implementation
// ============================================================================

fn mysql_row(row: &sqlx::mysql::MySqlRow) -> Result<Document> {
    row_to_document(
        row.get("id"),
        row.get("data"),
        row.get("created_at"),
        row.get("updated_at"),
    )
}

async fn get_mysql(pool: &MySqlPool, collection: &str, id: &str) -> Result<Option<Document>> {
    let row = sqlx::query(
        "SELECT id, data, created_at, updated_at FROM documents WHERE collection = ? AND id = ?",
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to read document '{}/{}'", collection, id))?;

    row.as_ref().map(mysql_row).transpose()
}

async fn list_mysql(pool: &MySqlPool, collection: &str, limit: i64) -> Result<Vec<Document>> {
    let rows = if limit < 0 {
        sqlx::query(
            "SELECT id, data, created_at, updated_at FROM documents WHERE collection = ? ORDER BY seq",
        )
        .bind(collection)
        .fetch_all(pool)
        .await
    } else {
        sqlx::query(
            "SELECT id, data, created_at, updated_at FROM documents WHERE collection = ? ORDER BY seq LIMIT ?",
        )
        .bind(collection)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
    .with_context(|| format!("Failed to list collection '{}'", collection))?;

    rows.iter().map(mysql_row).collect()
}

async fn find_mysql(pool: &MySqlPool, collection: &str, path: &str, encoded: &str) -> Result<Vec<Document>> {
    let rows = sqlx::query(
        "SELECT id, data, created_at, updated_at FROM documents \
         WHERE collection = ? AND JSON_EXTRACT(data, ?) = CAST(? AS JSON) ORDER BY seq",
    )
    .bind(collection)
    .bind(path)
    .bind(encoded)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to query collection '{}'", collection))?;

    rows.iter().map(mysql_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use serde_json::json;

    async fn setup() -> SqlxDocumentStore {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxDocumentStore::new(pool)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = setup().await;
        let doc = store
            .insert("articles", json!({"title": "Budgeting 101", "id": "ignored"}))
            .await
            .unwrap();

        assert_eq!(doc.id.len(), 32);
        assert!(doc.data.get("id").is_none());

        let found = store.get("articles", &doc.id).await.unwrap().unwrap();
        assert_eq!(found.data["title"], "Budgeting 101");
        assert!(store.get("courses", &doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order_and_limit() {
        let store = setup().await;
        for i in 0..5 {
            store.insert("articles", json!({"n": i})).await.unwrap();
        }
        store.insert("reels", json!({"n": 99})).await.unwrap();

        let all = store.list("articles", None).await.unwrap();
        let ns: Vec<i64> = all.iter().map(|d| d.data["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);

        let first = store.list("articles", Some(2)).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].data["n"], 1);

        assert!(store.list("articles", Some(0)).await.unwrap().is_empty());
        assert_eq!(store.list("articles", Some(usize::MAX)).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_find_by_field_matches_types() {
        let store = setup().await;
        store.insert("reels", json!({"status": "Public", "views": 3, "featured": true})).await.unwrap();
        store.insert("reels", json!({"status": "Private", "views": 3, "featured": false})).await.unwrap();
        store.insert("reels", json!({"caption": "no status"})).await.unwrap();

        let public = store.find_by_field("reels", "status", &json!("Public")).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].data["status"], "Public");

        let views = store.find_by_field("reels", "views", &json!(3)).await.unwrap();
        assert_eq!(views.len(), 2);

        let featured = store.find_by_field("reels", "featured", &json!(true)).await.unwrap();
        assert_eq!(featured.len(), 1);

        assert!(store.find_by_field("reels", "status", &json!("public")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_field_rejects_path_injection() {
        let store = setup().await;
        let err = store
            .find_by_field("reels", "status') OR 1=1 --", &json!("x"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid field name"));
    }

    #[tokio::test]
    async fn test_set_creates_then_replaces() {
        let store = setup().await;
        let created = store.set("users", "uid-1", json!({"displayName": "Ana"})).await.unwrap();
        let replaced = store.set("users", "uid-1", json!({"displayName": "Ana B"})).await.unwrap();

        assert_eq!(replaced.data, json!({"displayName": "Ana B"}));
        assert_eq!(replaced.created_at, created.created_at);
        assert_eq!(store.list("users", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_array_union_and_remove() {
        let store = setup().await;
        let doc = store.insert("reels", json!({"caption": "x"})).await.unwrap();

        let updated = store
            .update("reels", &doc.id, &[FieldUpdate::array_union("likes", vec![json!("u1")])])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.data["likes"], json!(["u1"]));

        // Union never duplicates
        store
            .update("reels", &doc.id, &[FieldUpdate::array_union("likes", vec![json!("u1"), json!("u2")])])
            .await
            .unwrap();
        let reread = store.get("reels", &doc.id).await.unwrap().unwrap();
        assert_eq!(reread.data["likes"], json!(["u1", "u2"]));

        store
            .update("reels", &doc.id, &[FieldUpdate::array_remove("likes", vec![json!("u1")])])
            .await
            .unwrap();
        let reread = store.get("reels", &doc.id).await.unwrap().unwrap();
        assert_eq!(reread.data["likes"], json!(["u2"]));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = setup().await;
        let result = store
            .update("reels", "nope", &[FieldUpdate::set("caption", json!("x"))])
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_unions_are_not_lost() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store: DynDocumentStore = SqlxDocumentStore::boxed(pool);
        let doc = store.insert("reels", json!({"likes": []})).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            let id = doc.id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update("reels", &id, &[FieldUpdate::array_union("likes", vec![json!(format!("u{}", i))])])
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let reread = store.get("reels", &doc.id).await.unwrap().unwrap();
        assert_eq!(reread.data["likes"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = setup().await;
        let doc = store.insert("products", json!({"name": "Ledger"})).await.unwrap();
        assert!(store.delete("products", &doc.id).await.unwrap());
        assert!(!store.delete("products", &doc.id).await.unwrap());
        assert!(store.get("products", &doc.id).await.unwrap().is_none());
    }

    #[test]
    fn test_apply_patch_and_remove_where() {
        let mut data = json!({
            "comments": [
                {"id": "c1", "text": "first", "userId": "u1"},
                {"id": "c2", "text": "second", "userId": "u2"},
            ]
        });

        let mut patch = Map::new();
        patch.insert("text".to_string(), json!("edited"));
        apply_updates(
            &mut data,
            &[FieldUpdate::array_patch_where("comments", "id", json!("c2"), patch)],
        )
        .unwrap();
        assert_eq!(data["comments"][1]["text"], "edited");
        assert_eq!(data["comments"][0]["text"], "first");

        apply_updates(&mut data, &[FieldUpdate::array_remove_where("comments", "id", json!("c1"))]).unwrap();
        assert_eq!(data["comments"].as_array().unwrap().len(), 1);
        assert_eq!(data["comments"][0]["id"], "c2");
    }

    #[test]
    fn test_apply_union_replaces_non_array() {
        let mut data = json!({"likes": "corrupt"});
        apply_updates(&mut data, &[FieldUpdate::array_union("likes", vec![json!("u1")])]).unwrap();
        assert_eq!(data["likes"], json!(["u1"]));
    }

    #[test]
    fn test_apply_requires_object_body() {
        let mut data = json!([1, 2]);
        assert!(apply_updates(&mut data, &[FieldUpdate::set("a", json!(1))]).is_err());
    }

    #[test]
    fn test_decode_injects_id() {
        #[derive(serde::Deserialize)]
        struct Titled {
            id: String,
            title: String,
        }

        let doc = Document {
            id: "abc".to_string(),
            data: json!({"title": "T"}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let typed: Titled = doc.decode().unwrap();
        assert_eq!(typed.id, "abc");
        assert_eq!(typed.title, "T");
    }
}
