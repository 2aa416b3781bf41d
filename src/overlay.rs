//! Overlay lifecycle.
//!
//! Clicking a timeline item opens a side overlay carrying the item's
//! document actions. Opening polls for the overlay with a hard ceiling;
//! closing works through an escalation ladder (backdrop click, one retry,
//! close button) and is best-effort. A stuck overlay is logged and
//! tolerated, the next item click usually replaces it.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::page::{ElementRef, Page};
use crate::wait::poll_until;

// ============================================================================
// Detection
// ============================================================================

/// Score bonus for a candidate carrying a recognized close control. Dwarfs
/// any realistic rendered area so a true dialog always beats a large
/// decorative container.
const CLOSE_CONTROL_BONUS: f64 = 1_000_000.0;

/// The currently active overlay, if one is open.
///
/// Among visible candidates, picks the one with the largest rendered area,
/// with a large bonus when a recognized close control sits inside it.
pub async fn active_overlay(page: &dyn Page, config: &Config) -> Option<ElementRef> {
    let mut best: Option<(f64, ElementRef)> = None;
    for candidate in page.query(&config.selectors.overlay).await {
        let rect = candidate.rect().await;
        if !rect.is_visible() {
            continue;
        }
        let mut score = rect.area();
        if candidate
            .query_first(&config.selectors.close_control)
            .await
            .is_some()
        {
            score += CLOSE_CONTROL_BONUS;
        }
        if best.as_ref().is_none_or(|(top, _)| score > *top) {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, overlay)| overlay)
}

/// Opens the overlay for one timeline item.
///
/// Scrolls the item into view, clicks it, settles, then polls for the
/// active overlay up to the configured ceiling. A timeout yields
/// [`Error::OverlayTimeout`], which the caller treats as skip-this-item.
pub async fn open_for_item(
    page: &dyn Page,
    item: &ElementRef,
    index: usize,
    config: &Config,
) -> Result<ElementRef> {
    item.scroll_into_view().await;
    item.click()
        .await
        .map_err(|err| Error::page(format!("item {index} click failed: {err}")))?;
    tokio::time::sleep(config.pace().open_settle).await;

    let ceiling = config.timings.overlay_ceiling;
    poll_until(config.pace().overlay_poll, ceiling, || {
        active_overlay(page, config)
    })
    .await
    .ok_or_else(|| Error::overlay_timeout(index, ceiling.as_millis() as u64))
}

// ============================================================================
// Closing
// ============================================================================

/// Closes the overlay, best-effort.
///
/// Escalation: backdrop center-click resolved through hit testing, one
/// retry, then the close button (inside the overlay first, page-wide as the
/// last resort). Each step gets a bounded overlay-gone wait. Returns whether
/// the overlay actually went away.
pub async fn close(page: &dyn Page, overlay: &ElementRef, config: &Config) -> bool {
    for attempt in 1..=2u32 {
        if click_backdrop(page, config).await && overlay_gone(overlay, config).await {
            return true;
        }
        debug!(attempt, "Backdrop click did not close overlay");
        tokio::time::sleep(config.pace().backdrop_click_gap).await;
    }

    let close_button = match overlay.query_first(&config.selectors.close_control).await {
        Some(button) => Some(button),
        None => page.query_first(&config.selectors.close_control).await,
    };
    if let Some(button) = close_button {
        if let Err(err) = button.click().await {
            debug!(error = %err, "Close button click failed");
        } else if overlay_gone(overlay, config).await {
            return true;
        }
    }

    warn!("Overlay did not close, moving on");
    false
}

/// Clicks whatever actually sits at the backdrop's center.
///
/// The backdrop is usually covered by the topmost stacking context, so the
/// click goes to the element the page would hit at that point, not to the
/// backdrop node itself.
async fn click_backdrop(page: &dyn Page, config: &Config) -> bool {
    let Some(backdrop) = visible_backdrop(page, config).await else {
        return false;
    };
    let (x, y) = backdrop.rect().await.center();
    let target = match page.element_at(x, y).await {
        Some(hit) => hit,
        None => backdrop,
    };
    match target.click().await {
        Ok(()) => true,
        Err(err) => {
            debug!(error = %err, "Backdrop click failed");
            false
        }
    }
}

async fn visible_backdrop(page: &dyn Page, config: &Config) -> Option<ElementRef> {
    for candidate in page.query(&config.selectors.backdrop).await {
        if candidate.rect().await.is_visible() {
            return Some(candidate);
        }
    }
    None
}

/// Bounded wait for the overlay to detach or collapse.
async fn overlay_gone(overlay: &ElementRef, config: &Config) -> bool {
    poll_until(
        config.timings.overlay_gone_poll,
        config.pace().close_check_window,
        || async {
            if !overlay.is_connected().await || !overlay.rect().await.is_visible() {
                Some(())
            } else {
                None
            }
        },
    )
    .await
    .is_some()
}

// ============================================================================
// Tests
// ============================================================================
