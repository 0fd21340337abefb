// Newsdesk Core
//
// Storage-agnostic article publishing: the article data model, the store traits
// the repository is written against, in-memory store implementations, and the
// ArticleRepository that keeps the shared index document consistent.

pub mod article;
pub mod error;
pub mod id;
pub mod memory;
pub mod repository;
pub mod traits;

pub use article::{ArticleDetail, ArticleIndexEntry, ArticleSubmission, ImageUpload};
pub use error::{NewsdeskError, Result};
pub use id::{ArticleId, ArticleIdGenerator};
pub use memory::{InMemoryCredentialStore, InMemoryObjectStore};
pub use repository::{ArticleRepository, ARTICLES_PREFIX, IMAGES_PREFIX, INDEX_KEY};
pub use traits::{CredentialStore, ObjectStore, UserRecord};
