//! Typed access to document collections
//!
//! [`Collection<T>`] wraps the untyped [`DocumentStore`] for one model type.
//! Each content model names its collection through [`Collected`].

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::marker::PhantomData;

use crate::db::documents::{to_body, Document, DynDocumentStore, FieldUpdate};
use crate::models::{Article, Course, Product, Reel, Review, ShopCategory, Subscription, Tip, UserProfile};

/// A model stored as documents in a named collection.
pub trait Collected: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;
}

impl Collected for Article {
    const COLLECTION: &'static str = "articles";
}

impl Collected for Course {
    const COLLECTION: &'static str = "courses";
}

impl Collected for Reel {
    const COLLECTION: &'static str = "reels";
}

impl Collected for Review {
    const COLLECTION: &'static str = "reviews";
}

impl Collected for Product {
    const COLLECTION: &'static str = "products";
}

impl Collected for ShopCategory {
    const COLLECTION: &'static str = "shopcategories";
}

impl Collected for UserProfile {
    const COLLECTION: &'static str = "users";
}

impl Collected for Subscription {
    const COLLECTION: &'static str = "nlemails";
}

impl Collected for Tip {
    const COLLECTION: &'static str = "tip";
}

/// Collections that administrators may edit through the raw document API
pub const CONTENT_COLLECTIONS: &[&str] = &[
    Article::COLLECTION,
    Course::COLLECTION,
    Reel::COLLECTION,
    Product::COLLECTION,
    ShopCategory::COLLECTION,
    Tip::COLLECTION,
];

/// Typed view of one collection.
pub struct Collection<T> {
    store: DynDocumentStore,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Collected> Collection<T> {
    pub fn new(store: DynDocumentStore) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    /// All documents in insertion order, optionally capped
    pub async fn list(&self, limit: Option<usize>) -> Result<Vec<T>> {
        let docs = self.store.list(T::COLLECTION, limit).await?;
        Ok(decode_all(docs))
    }

    /// Documents whose top-level `field` equals `value`
    pub async fn find_by(&self, field: &str, value: Value) -> Result<Vec<T>> {
        let docs = self.store.find_by_field(T::COLLECTION, field, &value).await?;
        Ok(decode_all(docs))
    }

    /// Insert with a generated id; returns the stored model
    pub async fn insert(&self, item: &T) -> Result<T> {
        let doc = self.store.insert(T::COLLECTION, to_body(item)?).await?;
        doc.decode()
    }

    /// Create or replace under a known id
    pub async fn set(&self, id: &str, item: &T) -> Result<T> {
        let doc = self.store.set(T::COLLECTION, id, to_body(item)?).await?;
        doc.decode()
    }

    pub async fn update(&self, id: &str, updates: &[FieldUpdate]) -> Result<Option<T>> {
        self.store
            .update(T::COLLECTION, id, updates)
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.store.delete(T::COLLECTION, id).await
    }
}

/// Decode documents, skipping (and logging) any that don't fit the model.
fn decode_all<T: Collected>(docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match doc.decode() {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping document in '{}': {:#}", T::COLLECTION, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations, SqlxDocumentStore};
    use serde_json::json;

    async fn store() -> DynDocumentStore {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqlxDocumentStore::boxed(pool)
    }

    #[tokio::test]
    async fn test_insert_returns_generated_id() {
        let tips = Collection::<Tip>::new(store().await);
        let tip = tips
            .insert(&Tip {
                id: String::new(),
                title: "Pay yourself first".to_string(),
                content: "Automate savings.".to_string(),
            })
            .await
            .unwrap();

        assert!(!tip.id.is_empty());
        assert_eq!(tips.get(&tip.id).await.unwrap().unwrap(), tip);
    }

    #[tokio::test]
    async fn test_list_skips_malformed_documents() {
        let store = store().await;
        store.insert("reviews", json!({"courseId": "c1", "userId": "u1", "rating": 5})).await.unwrap();
        // Missing required fields
        store.insert("reviews", json!({"rating": "five"})).await.unwrap();

        let reviews = Collection::<Review>::new(store);
        let all = reviews.list(None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rating, 5);
    }

    #[tokio::test]
    async fn test_find_by_field() {
        let store = store().await;
        let reviews = Collection::<Review>::new(store.clone());
        store.insert("reviews", json!({"courseId": "c1", "userId": "u1", "rating": 5})).await.unwrap();
        store.insert("reviews", json!({"courseId": "c2", "userId": "u1", "rating": 3})).await.unwrap();

        let c1 = reviews.find_by("courseId", json!("c1")).await.unwrap();
        assert_eq!(c1.len(), 1);
        assert_eq!(c1[0].course_id, "c1");
    }

    #[test]
    fn test_profiles_are_not_admin_editable() {
        assert!(!CONTENT_COLLECTIONS.contains(&UserProfile::COLLECTION));
        assert!(!CONTENT_COLLECTIONS.contains(&Review::COLLECTION));
        assert!(CONTENT_COLLECTIONS.contains(&"reels"));
    }
}
