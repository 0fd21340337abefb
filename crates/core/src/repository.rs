// Article repository
// Decision: All index mutations are serialized through one in-process lock
// Decision: Delete rewrites the index before removing objects; orphaned objects are
//           preferred over index entries pointing at missing objects
//
// The index document (`articles.json`) is the only shared mutable state. Object
// uploads happen outside the lock; only the read-modify-write of the index is
// serialized. Separate processes writing to the same bucket are not coordinated.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::article::{ArticleDetail, ArticleIndexEntry, ArticleSubmission, ImageUpload};
use crate::error::{NewsdeskError, Result};
use crate::id::{ArticleId, ArticleIdGenerator};
use crate::traits::ObjectStore;

/// Key of the index document
pub const INDEX_KEY: &str = "articles.json";
/// Key prefix of article detail objects
pub const ARTICLES_PREFIX: &str = "articles/";
/// Key prefix of image objects
pub const IMAGES_PREFIX: &str = "articles_images/";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Key of the detail object for an index filename
pub fn detail_key(filename: &str) -> String {
    format!("{ARTICLES_PREFIX}{filename}")
}

/// Key of an uploaded image
pub fn image_key(id: &ArticleId, image: &ImageUpload) -> String {
    format!("{IMAGES_PREFIX}{}_{}", id.stamp(), image.safe_file_name())
}

/// Filenames come from clients on delete; anything that could escape the
/// article namespace cannot be in the index anyway.
fn is_plausible_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains(['/', '\\'])
        && filename != "."
        && filename != ".."
}

pub struct ArticleRepository {
    store: Arc<dyn ObjectStore>,
    ids: ArticleIdGenerator,
    index_lock: Mutex<()>,
}

impl ArticleRepository {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            ids: ArticleIdGenerator::new(),
            index_lock: Mutex::new(()),
        }
    }

    /// Store a new article and prepend it to the index
    pub async fn save(
        &self,
        submission: ArticleSubmission,
        image: Option<ImageUpload>,
    ) -> Result<ArticleIndexEntry> {
        let id = self.ids.next();
        let filename = id.filename();

        let image_ref = match image {
            Some(image) => {
                let key = image_key(&id, &image);
                let content_type = image.resolved_content_type();
                tracing::debug!(key = %key, size = image.bytes.len(), "Uploading article image");
                self.store.put(&key, image.bytes, &content_type).await?;
                Some(key)
            }
            None => None,
        };

        let detail = ArticleDetail::from_submission(submission, image_ref);
        let body = serde_json::to_vec_pretty(&detail)
            .map_err(|e| NewsdeskError::storage(format!("failed to encode article: {e}")))?;

        if let Err(e) = self
            .store
            .put(&detail_key(&filename), body, JSON_CONTENT_TYPE)
            .await
        {
            if let Some(key) = &detail.image {
                tracing::warn!(image = %key, "Article upload failed, image left orphaned");
            }
            return Err(e);
        }

        let entry = detail.index_entry(filename);

        let _guard = self.index_lock.lock().await;
        let mut index = self.read_index().await?;
        index.insert(0, entry.clone());
        if let Err(e) = self.write_index(&index).await {
            tracing::warn!(
                filename = %entry.filename,
                image = ?entry.image,
                "Index update failed, article objects left orphaned"
            );
            return Err(e);
        }

        tracing::info!(filename = %entry.filename, has_image = entry.image.is_some(), "Article saved");
        Ok(entry)
    }

    /// Remove an article from the index, then delete its objects
    pub async fn delete(&self, filename: &str) -> Result<()> {
        if !is_plausible_filename(filename) {
            return Err(NewsdeskError::not_found(filename));
        }

        let removed = {
            let _guard = self.index_lock.lock().await;
            let mut index = self.read_index().await?;
            let position = index
                .iter()
                .position(|entry| entry.filename == filename)
                .ok_or_else(|| NewsdeskError::not_found(filename))?;
            let removed = index.remove(position);
            self.write_index(&index).await?;
            removed
        };

        tracing::info!(filename = %filename, "Article removed from index");

        let detail_result = self.store.delete(&detail_key(filename)).await;
        if let Err(e) = &detail_result {
            tracing::error!(filename = %filename, "Failed to delete article object: {}", e);
        }

        let image_result = match &removed.image {
            Some(key) => {
                let result = self.store.delete(key).await;
                if let Err(e) = &result {
                    tracing::error!(image = %key, "Failed to delete article image: {}", e);
                }
                result
            }
            None => Ok(()),
        };

        detail_result.and(image_result)
    }

    /// Current index document, newest first
    pub async fn list(&self) -> Result<Vec<ArticleIndexEntry>> {
        self.read_index().await
    }

    /// Full stored record of one article
    pub async fn get(&self, filename: &str) -> Result<ArticleDetail> {
        if !is_plausible_filename(filename) {
            return Err(NewsdeskError::not_found(filename));
        }

        let body = self
            .store
            .get(&detail_key(filename))
            .await?
            .ok_or_else(|| NewsdeskError::not_found(filename))?;

        serde_json::from_slice(&body)
            .map_err(|e| NewsdeskError::storage(format!("article {filename} is corrupt: {e}")))
    }

    async fn read_index(&self) -> Result<Vec<ArticleIndexEntry>> {
        match self.store.get(INDEX_KEY).await? {
            None => Ok(Vec::new()),
            Some(body) => serde_json::from_slice(&body)
                .map_err(|e| NewsdeskError::storage(format!("index document is corrupt: {e}"))),
        }
    }

    async fn write_index(&self, index: &[ArticleIndexEntry]) -> Result<()> {
        let body = serde_json::to_vec_pretty(index)
            .map_err(|e| NewsdeskError::storage(format!("failed to encode index: {e}")))?;
        self.store.put(INDEX_KEY, body, JSON_CONTENT_TYPE).await
    }
}
