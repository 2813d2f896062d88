//! Feeds read through `oneio` (https, local files, gz/bz2 by extension)

use crate::sources::{DataSource, FeedReader, Registry};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::io::Read;
use tracing::info;

/// A feed read directly from its URL on every fetch
#[derive(Debug, Clone)]
pub struct RemoteSource {
    name: String,
    url: String,
}

impl RemoteSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// The latest extended feed of a registry under the given mirror
    pub fn for_registry(registry: Registry, mirror: &str) -> Self {
        Self::new(registry.name(), registry.feed_url(mirror))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Location of the checksum file published next to the feed
    pub fn md5_url(&self) -> String {
        format!("{}.md5", self.url)
    }

    /// Read the whole feed into memory
    pub async fn download(&self) -> Result<Vec<u8>> {
        info!("Fetching {} data from {}", self.name, self.url);
        read_all(self.url.clone())
            .await
            .with_context(|| format!("failed to read {}", self.url))
    }

    /// MD5 checksum published by the registry for the current feed
    pub async fn remote_md5(&self) -> Result<String> {
        let url = self.md5_url();
        let bytes = read_all(url.clone())
            .await
            .with_context(|| format!("failed to read {}", url))?;
        let text = String::from_utf8_lossy(&bytes);
        extract_md5(&text).ok_or_else(|| anyhow!("no md5 checksum found in {}", url))
    }
}

#[async_trait]
impl DataSource for RemoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<FeedReader> {
        let bytes = self.download().await?;
        Ok(Box::new(std::io::Cursor::new(bytes)))
    }
}

async fn read_all(path: String) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        let mut reader = oneio::get_reader(path.as_str())?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
    .await?
}

/// First 32-digit hex token of a checksum file, lowercased.
///
/// Registries publish either `MD5 (file) = <sum>` or `<sum>  file`.
pub(crate) fn extract_md5(text: &str) -> Option<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .find(|token| token.len() == 32 && token.chars().all(|c| c.is_ascii_hexdigit()))
        .map(|token| token.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_extract_md5() {
        assert_eq!(
            extract_md5("MD5 (delegated-apnic-extended-latest) = 0123456789ABCDEF0123456789abcdef\n"),
            Some("0123456789abcdef0123456789abcdef".to_string())
        );
        assert_eq!(
            extract_md5("d41d8cd98f00b204e9800998ecf8427e  delegated-arin-extended-latest"),
            Some("d41d8cd98f00b204e9800998ecf8427e".to_string())
        );
        assert_eq!(extract_md5("<html>not found</html>"), None);
    }

    #[test]
    fn test_registry_source() {
        let source = RemoteSource::for_registry(Registry::Lacnic, "https://mirror.example/stats");
        assert_eq!(source.name(), "lacnic");
        assert_eq!(
            source.md5_url(),
            "https://mirror.example/stats/lacnic/delegated-lacnic-extended-latest.md5"
        );
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delegated-test");
        std::fs::write(&path, "test|FR|ipv4|1.2.3.0|256|20100101|allocated\n").unwrap();

        let source = RemoteSource::new("test", path.to_str().unwrap());
        let mut reader = source.fetch().await.unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).await.unwrap();
        assert!(text.starts_with("test|FR|ipv4"));
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        let source = RemoteSource::new("test", path.to_str().unwrap());
        assert!(source.fetch().await.is_err());
    }
}
