//! TOML-backed catalog manifest.
//!
//! The manifest is re-read on every call so edits are picked up by the next
//! prewarm run without a restart.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use crate::application::repos::{
    CatalogRepo, ContentKind, ContentRecord, RepoError, TermKind, TermRecord,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Manifest {
    catalog_root: Option<String>,
    catalog_items: Vec<ContentRecord>,
    pages: Vec<ContentRecord>,
    posts: Vec<ContentRecord>,
    catalog_terms: Vec<TermRecord>,
    post_terms: Vec<TermRecord>,
}

#[derive(Debug, Clone)]
pub struct TomlCatalog {
    path: PathBuf,
}

impl TomlCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn manifest(&self) -> Result<Manifest, RepoError> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| RepoError::unavailable(format!("{}: {err}", self.path.display())))?;
        toml::from_str(&data)
            .map_err(|err| RepoError::malformed(format!("{}: {err}", self.path.display())))
    }
}

#[async_trait]
impl CatalogRepo for TomlCatalog {
    async fn catalog_root(&self) -> Result<Option<String>, RepoError> {
        Ok(self.manifest().await?.catalog_root)
    }

    async fn list_content(&self, kind: ContentKind) -> Result<Vec<ContentRecord>, RepoError> {
        let manifest = self.manifest().await?;
        Ok(match kind {
            ContentKind::CatalogItem => manifest.catalog_items,
            ContentKind::Page => manifest.pages,
            ContentKind::Post => manifest.posts,
        })
    }

    async fn list_terms(&self, kind: TermKind) -> Result<Vec<TermRecord>, RepoError> {
        let manifest = self.manifest().await?;
        Ok(match kind {
            TermKind::CatalogTerm => manifest.catalog_terms,
            TermKind::PostTerm => manifest.post_terms,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::application::repos::PublishStatus;

    use super::*;

    const MANIFEST: &str = r#"
catalog_root = "/shop/"

[[catalog_items]]
id = "widget"
permalink = "/product/widget/"
status = "published"

[[catalog_items]]
id = "prototype"
status = "draft"

[[catalog_terms]]
id = "tools"
permalink = "/product-category/tools/"
count = 3
"#;

    #[tokio::test]
    async fn reads_manifest_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, MANIFEST).unwrap();
        let catalog = TomlCatalog::new(&path);

        assert_eq!(
            catalog.catalog_root().await.unwrap().as_deref(),
            Some("/shop/")
        );

        let items = catalog.list_content(ContentKind::CatalogItem).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].status, PublishStatus::Draft);
        assert_eq!(items[1].permalink, None);

        assert!(catalog.list_content(ContentKind::Post).await.unwrap().is_empty());
        let terms = catalog.list_terms(TermKind::CatalogTerm).await.unwrap();
        assert_eq!(terms[0].count, 3);
    }

    #[tokio::test]
    async fn missing_manifest_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = TomlCatalog::new(dir.path().join("absent.toml"));
        let err = catalog.catalog_root().await.unwrap_err();
        assert!(matches!(err, RepoError::Unavailable(_)));
    }

    #[tokio::test]
    async fn invalid_manifest_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, "[[pages]]\nid = 3\n").unwrap();
        let err = TomlCatalog::new(&path)
            .list_content(ContentKind::Page)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Malformed { .. }));
    }
}
