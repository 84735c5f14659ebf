use crate::db::repository;
use crate::error::Result;
use crate::models::donation::{DonationRecord, ZakatType};
use rusqlite::Connection;

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: usize,
    pub limit: usize,
    pub search: Option<String>,
    pub category: Option<ZakatType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<DonationRecord>,
    pub page: usize,
    pub limit: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(usize),
    Gap,
}

fn normalize_page(page: usize) -> usize {
    page.max(1)
}

fn normalize_limit(limit: usize) -> usize {
    if (1..=MAX_PAGE_LIMIT).contains(&limit) {
        limit
    } else {
        tracing::warn!(limit, "page limit out of range, using default");
        DEFAULT_PAGE_LIMIT
    }
}

fn matches_search(donation: &DonationRecord, needle: &str) -> bool {
    donation.donor_name.to_lowercase().contains(needle)
        || donation.recipient_name.to_lowercase().contains(needle)
        || donation
            .on_behalf_of
            .iter()
            .any(|entry| entry.name.to_lowercase().contains(needle))
}

/// Filters and slices `donations` (expected newest first) into one page.
pub fn paginate(donations: Vec<DonationRecord>, query: &ListQuery) -> Page {
    let page = normalize_page(query.page);
    let limit = normalize_limit(query.limit);
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let filtered: Vec<DonationRecord> = donations
        .into_iter()
        .filter(|d| query.category.is_none_or(|c| d.category == c))
        .filter(|d| needle.as_deref().is_none_or(|n| matches_search(d, n)))
        .collect();

    let total_items = filtered.len();
    let total_pages = total_items.div_ceil(limit).max(1);
    let items = filtered
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Page {
        items,
        page,
        limit,
        total_items,
        total_pages,
    }
}

pub fn list_donations(conn: &Connection, query: &ListQuery) -> Result<Page> {
    let donations = repository::get_all_donations(conn)?;
    Ok(paginate(donations, query))
}

/// Page numbers for a pagination bar: everything up to 7 pages, otherwise the first and
/// last page plus two neighbours either side of `current`, with gaps in between.
pub fn page_window(current: usize, total_pages: usize) -> Vec<PageMarker> {
    if total_pages <= 7 {
        return (1..=total_pages).map(PageMarker::Page).collect();
    }

    let mut markers = vec![PageMarker::Page(1)];
    let left = current.saturating_sub(2).max(2);
    let right = (current + 2).min(total_pages - 1);
    if left > 2 {
        markers.push(PageMarker::Gap);
    }
    markers.extend((left..=right).map(PageMarker::Page));
    if right < total_pages - 1 {
        markers.push(PageMarker::Gap);
    }
    markers.push(PageMarker::Page(total_pages));
    markers
}
