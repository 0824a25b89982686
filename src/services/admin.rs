//! Raw document editing of the content collections, for admins

use serde_json::Value;

use crate::db::repositories::CONTENT_COLLECTIONS;
use crate::db::DynDocumentStore;
use crate::services::error::{ContentError, ContentResult};

pub struct AdminContentService {
    store: DynDocumentStore,
}

impl AdminContentService {
    pub fn new(store: DynDocumentStore) -> Self {
        Self { store }
    }

    /// Insert a document with a generated id. Returns the body with its id.
    pub async fn create(&self, collection: &str, body: Value) -> ContentResult<Value> {
        check_collection(collection)?;
        let doc = self.store.insert(collection, object(body)?).await?;
        tracing::info!("Created {}/{}", collection, doc.id);
        Ok(doc.decode()?)
    }

    /// Create or fully replace the document `id`.
    pub async fn replace(&self, collection: &str, id: &str, body: Value) -> ContentResult<Value> {
        check_collection(collection)?;
        let doc = self.store.set(collection, id, object(body)?).await?;
        tracing::info!("Replaced {}/{}", collection, id);
        Ok(doc.decode()?)
    }

    pub async fn delete(&self, collection: &str, id: &str) -> ContentResult<()> {
        check_collection(collection)?;
        if !self.store.delete(collection, id).await? {
            return Err(ContentError::not_found(format!("Document '{}/{}'", collection, id)));
        }
        tracing::info!("Deleted {}/{}", collection, id);
        Ok(())
    }
}

fn check_collection(collection: &str) -> ContentResult<()> {
    if CONTENT_COLLECTIONS.contains(&collection) {
        Ok(())
    } else {
        Err(ContentError::not_found(format!("Collection '{}'", collection)))
    }
}

fn object(mut body: Value) -> ContentResult<Value> {
    match &mut body {
        Value::Object(map) => {
            map.remove("id");
            Ok(body)
        }
        _ => Err(ContentError::validation("Document body must be a JSON object")),
    }
}
