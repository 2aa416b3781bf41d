//! Incremental list loading.
//!
//! The timeline loads more entries when its scroll container reaches the
//! bottom. The container is found by walking up from the first list item;
//! a page that scrolls on the window itself falls back to a window scroll.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::config::Config;
use crate::page::{ElementRef, Page};
use crate::timeline::list_items;

// ============================================================================
// Scrolling
// ============================================================================

/// Nearest scrollable ancestor of the first timeline item.
pub async fn scrollable_container(page: &dyn Page, config: &Config) -> Option<ElementRef> {
    let first = list_items(page, &config.selectors).await.into_iter().next()?;
    let mut current = first.parent().await;
    while let Some(element) = current {
        if element.is_scrollable().await {
            return Some(element);
        }
        current = element.parent().await;
    }
    None
}

/// Scrolls the list to the bottom and waits out the settle delay.
///
/// One step only; the caller loops and decides when to stop (no growth, or
/// the oldest loaded item passed the lower range bound).
pub async fn load_more(page: &dyn Page, config: &Config) {
    match scrollable_container(page, config).await {
        Some(container) => container.scroll_to_bottom().await,
        None => {
            debug!("No scroll container found, scrolling window");
            page.scroll_window_to_bottom().await;
        }
    }
    tokio::time::sleep(config.pace().scroll_settle).await;
}

// ============================================================================
// Tests
// ============================================================================
