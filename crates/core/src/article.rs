// Article types
//
// ArticleSubmission is what the publisher client sends, ArticleDetail is the
// full record stored per article, and ArticleIndexEntry is the summary kept in
// the shared index document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Fields submitted by the publisher client for a new article.
///
/// Any additional JSON fields are kept and stored on the detail object.
/// Absent text fields are stored as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ArticleSubmission {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Display date as entered by the publisher; never parsed
    #[serde(default)]
    pub date: Option<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub extra: Map<String, Value>,
}

impl ArticleSubmission {
    /// Parse the JSON text of the `data` form field
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Full stored record for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ArticleDetail {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    /// Store key of the attached image
    pub image: Option<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub extra: Map<String, Value>,
}

impl ArticleDetail {
    pub fn from_submission(submission: ArticleSubmission, image: Option<String>) -> Self {
        let mut extra = submission.extra;
        // The server owns these keys
        extra.remove("image");
        extra.remove("filename");

        Self {
            title: submission.title,
            subtitle: submission.subtitle,
            content: submission.content,
            date: submission.date,
            image,
            extra,
        }
    }

    /// Summary of this article for the index document
    pub fn index_entry(&self, filename: impl Into<String>) -> ArticleIndexEntry {
        ArticleIndexEntry {
            filename: filename.into(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            content: self.content.clone(),
            date: self.date.clone(),
            image: self.image.clone(),
        }
    }
}

/// One element of the index document (`articles.json`)
///
/// Entries written by earlier publishers may carry `null` text fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ArticleIndexEntry {
    /// Unique article identifier, e.g. `news_20240101120000000000.json`
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// An image attached to a submission
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// File name as sent by the client
    pub file_name: String,
    /// Content type declared on the multipart part, if any
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Final path component of the client file name.
    ///
    /// Keeps image keys inside the image namespace.
    pub fn safe_file_name(&self) -> String {
        let name = self
            .file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();
        match name {
            "" | "." | ".." => "image".to_string(),
            name => name.to_string(),
        }
    }

    /// Content type from the file extension, then the declared type
    pub fn resolved_content_type(&self) -> String {
        guess_content_type(&self.file_name)
            .map(str::to_string)
            .or_else(|| self.content_type.clone())
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}

fn guess_content_type(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let content_type = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "tif" | "tiff" => "image/tiff",
        _ => return None,
    };
    Some(content_type)
}
