use std::collections::HashSet;
use std::sync::Arc;

use url::Url;

use crate::enums::Region;
use crate::error::Result;
use crate::models::Lead;
use crate::providers::OutreachStore;

/// Path segments that precede a catalog page identifier.
const PAGE_SEGMENTS: [&str; 2] = ["catalogo", "filters"];

/// Base used to parse filter links stored without scheme and host.
const RELATIVE_BASE: &str = "http://localhost/";

/// Audience-wide content for one schedule run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContent {
    /// Deduplicated, in first-seen order.
    pub property_ids: Vec<i64>,
    pub region: Region,
    /// Distinct filter links of the audience, in lead order.
    pub filter_urls: Vec<String>,
    /// Static pages that contributed property ids.
    pub resolved_pages: Vec<String>,
    pub used_fallback: bool,
}

/// Turns the audience's saved filter links into the property set to send.
#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn OutreachStore>,
    default_region: Region,
    sample_size: u64,
}

impl ContentService {
    pub fn new(store: Arc<dyn OutreachStore>, default_region: Region, sample_size: u64) -> Self {
        Self {
            store,
            default_region,
            sample_size,
        }
    }

    /// Resolve once per run, shared by every recipient.
    ///
    /// When several pages resolve to different regions, the first page that
    /// contributed property ids decides the region. When nothing resolves,
    /// a sample of active properties and the default region are used instead.
    pub async fn resolve(&self, leads: &[Lead]) -> Result<ResolvedContent> {
        let filter_urls = distinct_filter_urls(leads);

        let mut page_ids: Vec<String> = Vec::new();
        for url in &filter_urls {
            match extract_page_id(url) {
                Some(page_id) if !page_ids.contains(&page_id) => page_ids.push(page_id),
                Some(_) => {}
                None => tracing::debug!("Filter link {} does not reference a catalog page", url),
            }
        }

        let mut property_ids = Vec::new();
        let mut seen = HashSet::new();
        let mut region = None;
        let mut resolved_pages = Vec::new();

        for page_id in &page_ids {
            let Some(page) = self.store.static_page(page_id).await? else {
                tracing::warn!("Static page {} not found", page_id);
                continue;
            };

            if page.property_ids.is_empty() {
                tracing::debug!("Static page {} has no properties", page_id);
                continue;
            }

            region.get_or_insert(page.region);
            for id in page.property_ids {
                if seen.insert(id) {
                    property_ids.push(id);
                }
            }
            resolved_pages.push(page.page_id);
        }

        if property_ids.is_empty() {
            let sample = self.store.active_property_sample(self.sample_size).await?;
            let mut seen = HashSet::new();
            let sample: Vec<i64> = sample
                .into_iter()
                .filter(|id| seen.insert(*id))
                .collect();

            tracing::info!(
                "No filter link resolved to properties; using {} active properties",
                sample.len()
            );

            return Ok(ResolvedContent {
                property_ids: sample,
                region: self.default_region,
                filter_urls,
                resolved_pages,
                used_fallback: true,
            });
        }

        Ok(ResolvedContent {
            property_ids,
            region: region.unwrap_or(self.default_region),
            filter_urls,
            resolved_pages,
            used_fallback: false,
        })
    }
}

/// Distinct non-empty filter links across the audience, in lead order.
pub fn distinct_filter_urls(leads: &[Lead]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for url in leads.iter().filter_map(|l| l.filter_config.as_deref()) {
        let url = url.trim();
        if !url.is_empty() && !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Extract the catalog page identifier from `/catalogo/<id>` or `/filters/<id>`
/// links, absolute or path-relative. Query strings and fragments are ignored.
pub fn extract_page_id(filter_url: &str) -> Option<String> {
    let parsed = parse_link(filter_url)?;

    let segments: Vec<&str> = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();

    let (last, rest) = segments.split_last()?;
    if !rest.iter().any(|s| PAGE_SEGMENTS.contains(&s.to_lowercase().as_str())) {
        return None;
    }
    if PAGE_SEGMENTS.contains(&last.to_lowercase().as_str()) {
        return None;
    }

    let decoded = urlencoding::decode(last).ok()?;
    Some(decoded.into_owned())
}

/// Parse an absolute link, or resolve a relative one against a dummy host.
pub fn parse_link(link: &str) -> Option<Url> {
    let link = link.trim();
    match Url::parse(link) {
        Ok(url) if url.has_host() => Some(url),
        _ => Url::parse(RELATIVE_BASE).ok()?.join(link).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ lead, page, MemoryStore };

    #[test]
    fn test_extract_page_id_shapes() {
        assert_eq!(
            extract_page_id("https://leiloes.example.com/catalogo/apto-copacabana"),
            Some("apto-copacabana".to_string())
        );
        assert_eq!(extract_page_id("/filters/abc123?utm=wa#top"), Some("abc123".to_string()));
        assert_eq!(extract_page_id("catalogo/casa%20sp"), Some("casa sp".to_string()));
        assert_eq!(extract_page_id("https://x.com/catalogo/"), None);
        assert_eq!(extract_page_id("https://x.com/imoveis/123"), None);
        assert_eq!(extract_page_id("https://x.com/"), None);
    }

    #[test]
    fn test_distinct_filter_urls_keep_lead_order() {
        let leads = vec![
            lead("A", None, None, Some("/catalogo/b")),
            lead("B", None, None, Some(" /catalogo/a ")),
            lead("C", None, None, Some("/catalogo/b")),
            lead("D", None, None, None)
        ];
        assert_eq!(distinct_filter_urls(&leads), vec!["/catalogo/b", "/catalogo/a"]);
    }

    #[tokio::test]
    async fn test_merges_and_dedups_property_ids() {
        let store = Arc::new(MemoryStore::new());
        store.add_page(page("rj-zona-sul", &[101, 102, 103], Region::Rj)).await;
        store.add_page(page("sp-centro", &[103, 104], Region::Sp)).await;

        let leads = vec![
            lead("A", None, None, Some("https://site.com/catalogo/rj-zona-sul")),
            lead("B", None, None, Some("/filters/sp-centro"))
        ];

        let content = ContentService::new(store, Region::Sp, 10).resolve(&leads).await.unwrap();
        assert_eq!(content.property_ids, vec![101, 102, 103, 104]);
        // First resolved page decides the region
        assert_eq!(content.region, Region::Rj);
        assert_eq!(content.resolved_pages, vec!["rj-zona-sul", "sp-centro"]);
        assert!(!content.used_fallback);
    }

    #[tokio::test]
    async fn test_region_ignores_pages_without_properties() {
        let store = Arc::new(MemoryStore::new());
        store.add_page(page("vazio", &[], Region::Rj)).await;
        store.add_page(page("sp-centro", &[7], Region::Sp)).await;

        let leads = vec![
            lead("A", None, None, Some("/catalogo/vazio")),
            lead("B", None, None, Some("/catalogo/sp-centro"))
        ];

        let content = ContentService::new(store, Region::Rj, 10).resolve(&leads).await.unwrap();
        assert_eq!(content.region, Region::Sp);
        assert_eq!(content.property_ids, vec![7]);
    }

    #[tokio::test]
    async fn test_falls_back_to_active_sample() {
        let store = Arc::new(MemoryStore::new());
        for id in 1..=5 {
            store.add_property(id, id != 5).await;
        }

        let leads = vec![
            lead("A", None, None, Some("/catalogo/nao-existe")),
            lead("B", None, None, None)
        ];

        let content = ContentService::new(store, Region::Rj, 3).resolve(&leads).await.unwrap();
        assert!(content.used_fallback);
        assert_eq!(content.region, Region::Rj);
        assert_eq!(content.property_ids, vec![4, 3, 2]);
        assert_eq!(content.filter_urls, vec!["/catalogo/nao-existe"]);
    }

    #[tokio::test]
    async fn test_malformed_page_fails_resolution() {
        let store = Arc::new(MemoryStore::new());
        let mut bad = page("mg", &[1], Region::Rj);
        bad.page_type = "mg".to_string();
        store.add_page(bad).await;

        let leads = vec![lead("A", None, None, Some("/catalogo/mg"))];
        let result = ContentService::new(store, Region::Rj, 10).resolve(&leads).await;
        assert!(result.is_err());
    }
}
