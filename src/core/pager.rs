//! # Pager
//!
//! Compresses a page range into the handful of numbers a pager shows:
//! the first three pages, the last page, and the current page with its
//! neighbours. Gaps become a single [`PageItem::Ellipsis`].
//!
//! ```text
//! compute_page_items(7, 10)  →  1 2 3 … 6 7 8 … 10
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(i64),
    Ellipsis,
}

/// Pure and total: `total_pages <= 0` gives an empty list, an out-of-range
/// `current_page` only loses the neighbours that fall outside `[1, total]`.
pub fn compute_page_items(current_page: i64, total_pages: i64) -> Vec<PageItem> {
    if total_pages <= 0 {
        return Vec::new();
    }

    let mut pages: Vec<i64> = [
        1,
        2,
        3,
        total_pages,
        current_page.saturating_sub(1),
        current_page,
        current_page.saturating_add(1),
    ]
    .into_iter()
    .filter(|page| (1..=total_pages).contains(page))
    .collect();
    pages.sort_unstable();
    pages.dedup();

    let mut items = Vec::with_capacity(pages.len() * 2);
    let mut previous: Option<i64> = None;
    for page in pages {
        if let Some(prev) = previous
            && page - prev > 1
        {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(page));
        previous = Some(page);
    }
    items
}

/// A pager entry ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerEntry {
    Link {
        page: i64,
        href: String,
        current: bool,
    },
    Ellipsis,
}

/// [`compute_page_items`] with an href attached to every page number.
pub fn pager_links<F>(current_page: i64, total_pages: i64, build_href: F) -> Vec<PagerEntry>
where
    F: Fn(i64) -> String,
{
    compute_page_items(current_page, total_pages)
        .into_iter()
        .map(|item| match item {
            PageItem::Page(page) => PagerEntry::Link {
                page,
                href: build_href(page),
                current: page == current_page,
            },
            PageItem::Ellipsis => PagerEntry::Ellipsis,
        })
        .collect()
}
