//! URL enumeration.
//!
//! A flat walk over the storefront's addressable content producing the
//! ordered, de-duplicated list of paths a prewarm run visits.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::application::repos::{
    CatalogRepo, ContentKind, ContentRecord, PublishStatus, TermKind, TermRecord,
};

const SOURCE: &str = "prewarm::enumerator";

#[derive(Clone)]
pub struct UrlEnumerator {
    repo: Arc<dyn CatalogRepo>,
    site: Url,
}

impl UrlEnumerator {
    /// `site` is the public storefront URL permalinks are resolved against.
    pub fn new(repo: Arc<dyn CatalogRepo>, site: Url) -> Self {
        Self { repo, site }
    }

    /// Home, catalog root, catalog items, content pages, populated catalog
    /// terms, posts, then populated post terms.
    pub async fn enumerate(&self) -> Vec<String> {
        let mut paths = PathList::default();
        paths.push("/".to_string());

        match self.repo.catalog_root().await {
            Ok(Some(root)) => self.push_permalink(&mut paths, "catalog_root", "root", &root),
            Ok(None) => {}
            Err(err) => warn!(
                target = SOURCE,
                op = "enumerate",
                kind = "catalog_root",
                error = %err,
                "failed to read catalog root"
            ),
        }

        self.push_content(&mut paths, ContentKind::CatalogItem).await;
        self.push_content(&mut paths, ContentKind::Page).await;
        self.push_terms(&mut paths, TermKind::CatalogTerm).await;
        self.push_content(&mut paths, ContentKind::Post).await;
        self.push_terms(&mut paths, TermKind::PostTerm).await;

        debug!(
            target = SOURCE,
            op = "enumerate",
            count = paths.len(),
            "enumerated prewarm urls"
        );
        paths.into_vec()
    }

    async fn push_content(&self, paths: &mut PathList, kind: ContentKind) {
        let records = match self.repo.list_content(kind).await {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "enumerate",
                    kind = kind.as_str(),
                    error = %err,
                    "failed to list content, skipping kind"
                );
                return;
            }
        };

        for ContentRecord {
            id,
            permalink,
            status,
        } in records
        {
            if status != PublishStatus::Published {
                continue;
            }
            self.push_optional(paths, kind.as_str(), &id, permalink.as_deref());
        }
    }

    async fn push_terms(&self, paths: &mut PathList, kind: TermKind) {
        let records = match self.repo.list_terms(kind).await {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "enumerate",
                    kind = kind.as_str(),
                    error = %err,
                    "failed to list terms, skipping kind"
                );
                return;
            }
        };

        for TermRecord {
            id,
            permalink,
            count,
        } in records
        {
            if count == 0 {
                continue;
            }
            self.push_optional(paths, kind.as_str(), &id, permalink.as_deref());
        }
    }

    fn push_optional(&self, paths: &mut PathList, kind: &str, id: &str, permalink: Option<&str>) {
        match permalink {
            Some(permalink) => self.push_permalink(paths, kind, id, permalink),
            None => warn!(
                target = SOURCE,
                op = "enumerate",
                kind,
                id,
                "record has no permalink, skipping"
            ),
        }
    }

    fn push_permalink(&self, paths: &mut PathList, kind: &str, id: &str, permalink: &str) {
        match self.resolve(permalink) {
            Some(path) => paths.push(path),
            None => warn!(
                target = SOURCE,
                op = "enumerate",
                kind,
                id,
                permalink,
                "permalink does not resolve to this site, skipping"
            ),
        }
    }

    /// Site-relative `path[?query]` for `permalink`, or `None` when it is
    /// unparseable or points at another host.
    pub fn resolve(&self, permalink: &str) -> Option<String> {
        let permalink = permalink.trim();
        if permalink.is_empty() {
            return None;
        }

        let url = self.site.join(permalink).ok()?;
        if url.host_str() != self.site.host_str()
            || url.port_or_known_default() != self.site.port_or_known_default()
        {
            return None;
        }

        Some(match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        })
    }
}

/// Insertion-ordered set of paths.
#[derive(Debug, Default)]
struct PathList {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl PathList {
    fn push(&mut self, path: String) {
        if self.seen.insert(path.clone()) {
            self.ordered.push(path);
        }
    }

    fn len(&self) -> usize {
        self.ordered.len()
    }

    fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::application::repos::RepoError;

    struct FixedCatalog {
        fail_pages: bool,
    }

    fn content(id: &str, permalink: Option<&str>, status: PublishStatus) -> ContentRecord {
        ContentRecord {
            id: id.to_string(),
            permalink: permalink.map(str::to_string),
            status,
        }
    }

    fn term(id: &str, permalink: &str, count: u64) -> TermRecord {
        TermRecord {
            id: id.to_string(),
            permalink: Some(permalink.to_string()),
            count,
        }
    }

    #[async_trait]
    impl CatalogRepo for FixedCatalog {
        async fn catalog_root(&self) -> Result<Option<String>, RepoError> {
            Ok(Some("https://shop.example/shop/".to_string()))
        }

        async fn list_content(&self, kind: ContentKind) -> Result<Vec<ContentRecord>, RepoError> {
            Ok(match kind {
                ContentKind::CatalogItem => vec![
                    content("widget", Some("/product/widget/"), PublishStatus::Published),
                    content("draft", Some("/product/draft/"), PublishStatus::Draft),
                    content("nolink", None, PublishStatus::Published),
                    content("foreign", Some("https://elsewhere.example/x/"), PublishStatus::Published),
                ],
                ContentKind::Page if self.fail_pages => {
                    return Err(RepoError::unavailable("pages offline"));
                }
                ContentKind::Page => vec![
                    content("about", Some("/about/"), PublishStatus::Published),
                    content("home-again", Some("/"), PublishStatus::Published),
                ],
                ContentKind::Post => vec![content(
                    "launch",
                    Some("/blog/launch/"),
                    PublishStatus::Published,
                )],
            })
        }

        async fn list_terms(&self, kind: TermKind) -> Result<Vec<TermRecord>, RepoError> {
            Ok(match kind {
                TermKind::CatalogTerm => vec![
                    term("tools", "/product-category/tools/", 4),
                    term("empty", "/product-category/empty/", 0),
                ],
                TermKind::PostTerm => vec![term("news", "/category/news/", 1)],
            })
        }
    }

    fn enumerator(fail_pages: bool) -> UrlEnumerator {
        UrlEnumerator::new(
            Arc::new(FixedCatalog { fail_pages }),
            Url::parse("https://shop.example/").unwrap(),
        )
    }

    #[tokio::test]
    async fn enumerates_in_documented_order_without_duplicates() {
        let paths = enumerator(false).enumerate().await;
        assert_eq!(
            paths,
            vec![
                "/",
                "/shop/",
                "/product/widget/",
                "/about/",
                "/product-category/tools/",
                "/blog/launch/",
                "/category/news/",
            ]
        );
    }

    #[tokio::test]
    async fn listing_failure_skips_only_that_kind() {
        let paths = enumerator(true).enumerate().await;
        assert!(!paths.iter().any(|path| path == "/about/"));
        assert!(paths.iter().any(|path| path == "/blog/launch/"));
    }

    #[test]
    fn resolve_keeps_query_and_rejects_foreign_hosts() {
        let enumerator = enumerator(false);
        assert_eq!(
            enumerator.resolve("https://shop.example/shop/?page=2").as_deref(),
            Some("/shop/?page=2")
        );
        assert_eq!(enumerator.resolve("relative/").as_deref(), Some("/relative/"));
        assert_eq!(enumerator.resolve("http://shop.example:8443/x/"), None);
        assert_eq!(enumerator.resolve("   "), None);
    }
}
