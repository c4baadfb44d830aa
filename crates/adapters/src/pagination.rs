//! Page-walking helpers shared by the platform listers

use alt_texter_domain::PlatformError;
use std::future::Future;

/// Fetch numbered pages (1-based) until a short page arrives or `limit`
/// items have been collected. The result never exceeds `limit`.
pub(crate) async fn collect_pages<T, F, Fut>(
    page_size: usize,
    limit: usize,
    mut fetch_page: F,
) -> Result<Vec<T>, PlatformError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, PlatformError>>,
{
    let page_size = page_size.max(1);
    let mut collected = Vec::new();
    let mut page = 1;

    while collected.len() < limit {
        let items = fetch_page(page).await?;
        let short = items.len() < page_size;
        tracing::debug!(page = page, count = items.len(), "Fetched page");
        collected.extend(items);
        if short {
            break;
        }
        page += 1;
    }

    collected.truncate(limit);
    Ok(collected)
}

/// Cursor pagination: each request carries the id of the last item seen
pub(crate) async fn collect_since<T, F, Fut, K>(
    page_size: usize,
    limit: usize,
    cursor_of: K,
    mut fetch_page: F,
) -> Result<Vec<T>, PlatformError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Vec<T>, PlatformError>>,
    K: Fn(&T) -> String,
{
    let page_size = page_size.max(1);
    let mut collected = Vec::new();
    let mut cursor = None;

    while collected.len() < limit {
        let items = fetch_page(cursor.clone()).await?;
        let short = items.len() < page_size;
        tracing::debug!(since_id = ?cursor, count = items.len(), "Fetched page");
        cursor = items.last().map(&cursor_of);
        collected.extend(items);
        if short || cursor.is_none() {
            break;
        }
    }

    collected.truncate(limit);
    Ok(collected)
}
