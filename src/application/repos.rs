//! Repository traits describing content adapters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("content source unavailable: {0}")]
    Unavailable(String),
    #[error("content source malformed: {message}")]
    Malformed { message: String },
}

impl RepoError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Published,
    Draft,
    Scheduled,
    Private,
}

/// Kinds of individually addressable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    CatalogItem,
    Page,
    Post,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CatalogItem => "catalog_item",
            Self::Page => "page",
            Self::Post => "post",
        }
    }
}

/// Kinds of taxonomy listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    CatalogTerm,
    PostTerm,
}

impl TermKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CatalogTerm => "catalog_term",
            Self::PostTerm => "post_term",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    #[serde(default)]
    pub permalink: Option<String>,
    pub status: PublishStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRecord {
    pub id: String,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub count: u64,
}

/// Read access to the storefront's addressable content.
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    /// Permalink of the catalog listing root, if the store has one.
    async fn catalog_root(&self) -> Result<Option<String>, RepoError>;

    async fn list_content(&self, kind: ContentKind) -> Result<Vec<ContentRecord>, RepoError>;

    async fn list_terms(&self, kind: TermKind) -> Result<Vec<TermRecord>, RepoError>;
}
