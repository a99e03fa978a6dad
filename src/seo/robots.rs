//! robots.txt

use super::{CONTENT_TYPE_TEXT, SeoDocument, SiteInfo};

/// Paths crawlers have no business in: API proxies and auth forms.
pub const DEFAULT_DISALLOW: &[&str] = &["/api/", "/auth/"];

pub fn render_robots(site_url: &str, disallow: &[&str]) -> String {
    let mut out = String::from("User-agent: *\nAllow: /\n");
    for path in disallow {
        out.push_str("Disallow: ");
        out.push_str(path);
        out.push('\n');
    }
    out.push('\n');
    out.push_str("Sitemap: ");
    out.push_str(site_url.trim_end_matches('/'));
    out.push_str("/sitemap.xml\n");
    out
}

pub fn build_robots(site: &SiteInfo) -> SeoDocument {
    site.document(CONTENT_TYPE_TEXT, render_robots(&site.url, DEFAULT_DISALLOW))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seo::test_site;

    #[test]
    fn test_robots_lists_disallow_and_sitemap() {
        let body = render_robots("https://reviews.test/", &["/api/"]);
        assert_eq!(
            body,
            "User-agent: *\nAllow: /\nDisallow: /api/\n\nSitemap: https://reviews.test/sitemap.xml\n"
        );
    }

    #[test]
    fn test_build_robots_document() {
        let doc = build_robots(&test_site());
        assert_eq!(doc.content_type, CONTENT_TYPE_TEXT);
        assert!(doc.body.contains("Disallow: /auth/"));
    }
}
