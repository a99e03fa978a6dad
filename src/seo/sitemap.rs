//! Sitemap generation.
//!
//! `/sitemap.xml` is a `<sitemapindex>` pointing at one static sitemap, one
//! category sitemap, and as many review and product sitemaps as the catalog
//! needs at [`SITEMAP_PAGE_SIZE`] URLs each.

use chrono::{DateTime, SecondsFormat, Utc};
use futures::join;
use log::{info, warn};

use super::xml::XmlWriter;
use super::{CONTENT_TYPE_XML, SeoDocument, SiteInfo};
use crate::api::FeedSource;
use crate::core::query::ReviewQuery;

pub const SITEMAP_PAGE_SIZE: u32 = 1000;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapUrl {
    pub loc: String,
    pub lastmod: Option<DateTime<Utc>>,
    pub changefreq: Option<ChangeFreq>,
    /// 0.0 to 1.0
    pub priority: Option<f32>,
}

impl SitemapUrl {
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            lastmod: None,
            changefreq: None,
            priority: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapRef {
    pub loc: String,
    pub lastmod: Option<DateTime<Utc>>,
}

/// Which sub-sitemap a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    Static,
    Categories,
    Reviews(u32),
    Products(u32),
}

impl SitemapKind {
    pub fn path(self) -> String {
        match self {
            SitemapKind::Static => "/sitemaps/static.xml".to_string(),
            SitemapKind::Categories => "/sitemaps/categories.xml".to_string(),
            SitemapKind::Reviews(page) => format!("/sitemaps/reviews-{page}.xml"),
            SitemapKind::Products(page) => format!("/sitemaps/products-{page}.xml"),
        }
    }
}

fn w3c_date(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn render_urlset(urls: &[SitemapUrl]) -> String {
    let mut w = XmlWriter::new();
    w.open("urlset", &[("xmlns", SITEMAP_NS)]);
    for url in urls {
        w.open("url", &[]).text("loc", &url.loc);
        if let Some(ref lastmod) = url.lastmod {
            w.text("lastmod", &w3c_date(lastmod));
        }
        if let Some(freq) = url.changefreq {
            w.text("changefreq", freq.as_str());
        }
        if let Some(priority) = url.priority {
            w.text("priority", &format!("{:.1}", priority.clamp(0.0, 1.0)));
        }
        w.close("url");
    }
    w.close("urlset");
    w.finish()
}

pub fn render_sitemap_index(refs: &[SitemapRef]) -> String {
    let mut w = XmlWriter::new();
    w.open("sitemapindex", &[("xmlns", SITEMAP_NS)]);
    for entry in refs {
        w.open("sitemap", &[]).text("loc", &entry.loc);
        if let Some(ref lastmod) = entry.lastmod {
            w.text("lastmod", &w3c_date(lastmod));
        }
        w.close("sitemap");
    }
    w.close("sitemapindex");
    w.finish()
}

/// Number of sitemap files needed for `total_items` URLs.
pub fn sitemap_page_count(total_items: u64) -> u32 {
    let pages = total_items.div_ceil(u64::from(SITEMAP_PAGE_SIZE));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

pub fn static_urls(site: &SiteInfo) -> Vec<SitemapUrl> {
    let mut home = SitemapUrl::new(site.absolute("/"));
    home.changefreq = Some(ChangeFreq::Hourly);
    home.priority = Some(1.0);

    let mut listing = SitemapUrl::new(site.absolute(&site.base_path));
    listing.changefreq = Some(ChangeFreq::Hourly);
    listing.priority = Some(0.9);

    let mut products = SitemapUrl::new(site.absolute("/products"));
    products.changefreq = Some(ChangeFreq::Daily);
    products.priority = Some(0.7);

    vec![home, listing, products]
}

/// Builds one sub-sitemap. Upstream failures give an empty `<urlset>`.
pub async fn build_sitemap(source: &dyn FeedSource, site: &SiteInfo, kind: SitemapKind) -> SeoDocument {
    let urls = match kind {
        SitemapKind::Static => static_urls(site),
        SitemapKind::Categories => category_urls(source, site).await,
        SitemapKind::Reviews(page) => review_urls(source, site, page).await,
        SitemapKind::Products(page) => product_urls(source, site, page).await,
    };
    info!("Sitemap {} with {} urls", kind.path(), urls.len());
    site.document(CONTENT_TYPE_XML, render_urlset(&urls))
}

async fn category_urls(source: &dyn FeedSource, site: &SiteInfo) -> Vec<SitemapUrl> {
    match source.categories().await {
        Ok(categories) => categories
            .into_iter()
            .map(|category| {
                let query = ReviewQuery {
                    category: Some(category.slug),
                    ..ReviewQuery::default()
                };
                let mut url = SitemapUrl::new(site.absolute(&query.href(&site.base_path, 1)));
                url.changefreq = Some(ChangeFreq::Daily);
                url.priority = Some(0.6);
                url
            })
            .collect(),
        Err(e) => {
            warn!("Category sitemap falling back to empty: {}", e);
            Vec::new()
        }
    }
}

async fn review_urls(source: &dyn FeedSource, site: &SiteInfo, page: u32) -> Vec<SitemapUrl> {
    match source
        .reviews_page(&ReviewQuery::default(), page.max(1), SITEMAP_PAGE_SIZE)
        .await
    {
        Ok(result) => result
            .items
            .into_iter()
            .map(|item| {
                let mut url = SitemapUrl::new(site.review_url(&item.id));
                url.lastmod = Some(item.created_at);
                url.changefreq = Some(ChangeFreq::Weekly);
                url.priority = Some(0.8);
                url
            })
            .collect(),
        Err(e) => {
            warn!("Review sitemap page {} falling back to empty: {}", page, e);
            Vec::new()
        }
    }
}

async fn product_urls(source: &dyn FeedSource, site: &SiteInfo, page: u32) -> Vec<SitemapUrl> {
    match source.products_page(page.max(1), SITEMAP_PAGE_SIZE).await {
        Ok(result) => result
            .items
            .into_iter()
            .map(|product| {
                let mut url = SitemapUrl::new(site.product_url(&product.id));
                url.lastmod = product.updated_at;
                url.changefreq = Some(ChangeFreq::Weekly);
                url.priority = Some(0.7);
                url
            })
            .collect(),
        Err(e) => {
            warn!("Product sitemap page {} falling back to empty: {}", page, e);
            Vec::new()
        }
    }
}

/// Builds `/sitemap.xml`. Review and product totals are fetched in parallel;
/// a failed count just leaves that kind out.
pub async fn build_sitemap_index(source: &dyn FeedSource, site: &SiteInfo) -> SeoDocument {
    let all_reviews = ReviewQuery::default();
    let (reviews, products) = join!(
        source.reviews_page(&all_reviews, 1, 1),
        source.products_page(1, 1),
    );

    let review_total = match reviews {
        Ok(page) => page.page_info.map(|info| info.total_items).unwrap_or(0),
        Err(e) => {
            warn!("Sitemap index: review count unavailable: {}", e);
            0
        }
    };
    let product_total = match products {
        Ok(page) => page.page_info.map(|info| info.total_items).unwrap_or(0),
        Err(e) => {
            warn!("Sitemap index: product count unavailable: {}", e);
            0
        }
    };

    let mut kinds = vec![SitemapKind::Static, SitemapKind::Categories];
    kinds.extend((1..=sitemap_page_count(review_total)).map(SitemapKind::Reviews));
    kinds.extend((1..=sitemap_page_count(product_total)).map(SitemapKind::Products));

    let refs: Vec<SitemapRef> = kinds
        .into_iter()
        .map(|kind| SitemapRef {
            loc: site.absolute(&kind.path()),
            lastmod: None,
        })
        .collect();
    info!(
        "Sitemap index: {} entries ({} reviews, {} products)",
        refs.len(),
        review_total,
        product_total
    );
    site.document(CONTENT_TYPE_XML, render_sitemap_index(&refs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HttpFeedSource, MockFeedSource};
    use crate::seo::test_site;
    use chrono::TimeZone;

    #[test]
    fn test_render_urlset_full_entry() {
        let mut url = SitemapUrl::new("https://reviews.test/reviews/a&b");
        url.lastmod = Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        url.changefreq = Some(ChangeFreq::Weekly);
        url.priority = Some(1.7);
        let xml = render_urlset(&[url]);
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("<loc>https://reviews.test/reviews/a&amp;b</loc>"));
        assert!(xml.contains("<lastmod>2024-05-01T10:00:00Z</lastmod>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert!(xml.contains("<priority>1.0</priority>"));
    }

    #[test]
    fn test_render_empty_urlset_is_well_formed() {
        let xml = render_urlset(&[]);
        assert!(xml.contains("<urlset"));
        assert!(xml.trim_end().ends_with("</urlset>"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_page_count() {
        assert_eq!(sitemap_page_count(0), 0);
        assert_eq!(sitemap_page_count(1), 1);
        assert_eq!(sitemap_page_count(1000), 1);
        assert_eq!(sitemap_page_count(1001), 2);
    }

    #[tokio::test]
    async fn test_index_lists_every_page() {
        let source = MockFeedSource::with_fixtures(2500);
        let doc = build_sitemap_index(&source, &test_site()).await;
        assert!(doc.body.contains("<sitemapindex"));
        assert!(doc.body.contains("https://reviews.test/sitemaps/static.xml"));
        assert!(doc.body.contains("https://reviews.test/sitemaps/categories.xml"));
        assert!(doc.body.contains("https://reviews.test/sitemaps/reviews-3.xml"));
        assert!(!doc.body.contains("reviews-4.xml"));
        // 2500 fixtures → 834 products → one product sitemap
        assert!(doc.body.contains("https://reviews.test/sitemaps/products-1.xml"));
        assert!(!doc.body.contains("products-2.xml"));
        assert_eq!(doc.content_type, CONTENT_TYPE_XML);
    }

    #[tokio::test]
    async fn test_review_sitemap_page() {
        let source = MockFeedSource::with_fixtures(1200);
        let doc = build_sitemap(&source, &test_site(), SitemapKind::Reviews(2)).await;
        assert_eq!(doc.body.matches("<url>").count(), 200);
        assert!(doc.body.contains("https://reviews.test/reviews/rev-1001"));
    }

    #[tokio::test]
    async fn test_category_sitemap_uses_listing_links() {
        let source = MockFeedSource::with_fixtures(10);
        let doc = build_sitemap(&source, &test_site(), SitemapKind::Categories).await;
        assert!(doc.body.contains("<loc>https://reviews.test/reviews?category=tech</loc>"));
    }

    #[tokio::test]
    async fn test_unconfigured_source_gives_empty_documents() {
        let source = HttpFeedSource::new(None);
        let site = test_site();

        let index = build_sitemap_index(&source, &site).await;
        assert_eq!(index.body.matches("<sitemap>").count(), 2);

        let reviews = build_sitemap(&source, &site, SitemapKind::Reviews(1)).await;
        assert!(reviews.body.contains("<urlset"));
        assert!(!reviews.body.contains("<url>"));
    }
}
