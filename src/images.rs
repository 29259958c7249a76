use std::{
    io,
    path::{Path, PathBuf},
};

use tracing::debug;

/// Uploaded film images, kept as files under one directory and served back
/// under a public base URL.
#[derive(Clone, Debug)]
pub struct ImageStore {
    root: PathBuf,
    base_url: String,
    placeholder_url: String,
}

impl ImageStore {
    pub fn new(root: PathBuf, base_url: &str, placeholder_url: &str) -> Self {
        Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
            placeholder_url: placeholder_url.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores an upload and returns the reference to save on the film.
    pub async fn put(&self, file_name: &str, bytes: &[u8]) -> io::Result<String> {
        let reference = stored_name(jiff::Timestamp::now().as_millisecond(), file_name);
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&reference), bytes).await?;
        debug!(reference = %reference, size = bytes.len(), "stored image");
        Ok(reference)
    }

    /// Removes a stored image. External URLs are left alone.
    pub async fn remove(&self, reference: &str) -> io::Result<()> {
        if is_external(reference) {
            return Ok(());
        }
        match tokio::fs::remove_file(self.root.join(reference)).await {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// Displayable URL for a stored reference, or the placeholder when the
    /// film has no image.
    pub fn url_for(&self, reference: Option<&str>) -> String {
        match reference.map(str::trim).filter(|r| !r.is_empty()) {
            None => self.placeholder_url.clone(),
            Some(r) if is_external(r) => r.to_string(),
            Some(r) => format!("{}/{}", self.base_url, urlencoding::encode(r)),
        }
    }
}

fn is_external(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// `<millis>-<name>`, whitespace runs turned into dashes and any directory
/// part dropped.
fn stored_name(millis: i64, file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = base.split_whitespace().collect::<Vec<_>>().join("-");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() { format!("{millis}-image") } else { format!("{millis}-{cleaned}") }
}
