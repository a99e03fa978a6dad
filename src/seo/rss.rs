//! RSS 2.0 feed of the newest reviews, paginated at [`RSS_PAGE_SIZE`].

use chrono::{DateTime, Utc};
use log::{info, warn};

use super::xml::XmlWriter;
use super::{CONTENT_TYPE_RSS, SeoDocument, SiteInfo};
use crate::api::{FeedItem, FeedSource};
use crate::core::query::ReviewQuery;

pub const RSS_PAGE_SIZE: u32 = 50;
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    /// URL this feed is served from (`atom:link rel="self"`).
    pub self_link: String,
    pub language: Option<String>,
    pub last_build: Option<DateTime<Utc>>,
}

/// Renders a channel. `item_link` maps an item to its absolute URL, which
/// doubles as its permalink guid.
pub fn render_rss<F>(channel: &Channel, items: &[FeedItem], item_link: F) -> String
where
    F: Fn(&FeedItem) -> String,
{
    let mut w = XmlWriter::new();
    w.open(
        "rss",
        &[("version", "2.0"), ("xmlns:atom", ATOM_NS), ("xmlns:dc", DC_NS)],
    );
    w.open("channel", &[])
        .text("title", &channel.title)
        .text("link", &channel.link)
        .text("description", &channel.description)
        .empty(
            "atom:link",
            &[
                ("href", channel.self_link.as_str()),
                ("rel", "self"),
                ("type", "application/rss+xml"),
            ],
        );
    if let Some(ref language) = channel.language {
        w.text("language", language);
    }
    if let Some(ref at) = channel.last_build {
        w.text("lastBuildDate", &at.to_rfc2822());
    }

    for item in items {
        let link = item_link(item);
        w.open("item", &[])
            .text("title", &item.title)
            .text("link", &link)
            .text_with("guid", &[("isPermaLink", "true")], &link)
            .text("pubDate", &item.created_at.to_rfc2822());
        if let Some(ref summary) = item.summary {
            w.text("description", summary);
        }
        if let Some(ref author) = item.author {
            w.text("dc:creator", author);
        }
        if let Some(ref category) = item.category {
            w.text("category", category);
        }
        if let Some(ref image) = item.image_url {
            w.empty(
                "enclosure",
                &[("url", image.as_str()), ("type", image_mime(image)), ("length", "0")],
            );
        }
        w.close("item");
    }

    w.close("channel");
    w.close("rss");
    w.finish()
}

fn image_mime(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else {
        "image/jpeg"
    }
}

/// Path the feed is served from. Page 1 has no query string.
pub fn rss_path(page: u32) -> String {
    if page <= 1 {
        "/rss.xml".to_string()
    } else {
        format!("/rss.xml?page={page}")
    }
}

/// Builds the page of the review feed that `query.page` asks for.
/// Upstream failures give a channel with no items.
pub async fn build_reviews_feed(source: &dyn FeedSource, site: &SiteInfo, query: &ReviewQuery) -> SeoDocument {
    let page = query.page.max(1);
    let items = match source.reviews_page(query, page, RSS_PAGE_SIZE).await {
        Ok(result) => result.items,
        Err(e) => {
            warn!("RSS page {} falling back to empty: {}", page, e);
            Vec::new()
        }
    };

    let channel = Channel {
        title: site.name.clone(),
        link: site.absolute(&query.href(&site.base_path, 1)),
        description: site.description.clone(),
        self_link: site.absolute(&rss_path(page)),
        language: None,
        last_build: items.iter().map(|item| item.created_at).max(),
    };
    info!("RSS page {} with {} items", page, items.len());
    let body = render_rss(&channel, &items, |item| site.review_url(&item.id));
    site.document(CONTENT_TYPE_RSS, body)
}
