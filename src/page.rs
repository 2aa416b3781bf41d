//! Host page abstraction.
//!
//! The engine never touches a DOM directly. Everything it needs from the
//! page, querying, geometry, clicking, hit testing, comes through the
//! [`Page`] and [`PageElement`] traits, injected by the embedder. This is
//! what makes the whole pipeline testable without a browser: the test
//! suite drives the engine against scripted fakes.
//!
//! Elements are handles, not snapshots. A handle can go stale when the page
//! re-renders; [`PageElement::is_connected`] reports that, and callers are
//! expected to re-query rather than trust an old handle across a settle
//! delay.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// Rect
// ============================================================================

/// Axis-aligned bounding box of an element, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Creates a rect from origin and size.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Center point of the rect.
    #[inline]
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Area in square pixels.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Whether the rect occupies any space on screen.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

// ============================================================================
// PageElement
// ============================================================================

/// Shared handle to a live element.
pub type ElementRef = Arc<dyn PageElement>;

/// A handle to one element on the host page.
#[async_trait]
pub trait PageElement: Send + Sync {
    /// All descendants matching `selector`, in document order.
    async fn query(&self, selector: &str) -> Vec<ElementRef>;

    /// First descendant matching `selector`.
    async fn query_first(&self, selector: &str) -> Option<ElementRef> {
        self.query(selector).await.into_iter().next()
    }

    /// Whether this element itself matches `selector`.
    async fn matches(&self, selector: &str) -> bool;

    /// Whether `other` is this element or one of its descendants.
    async fn contains(&self, other: &ElementRef) -> bool;

    /// Visible text content, whitespace-trimmed.
    async fn text(&self) -> String;

    /// Attribute value, if present.
    async fn attribute(&self, name: &str) -> Option<String>;

    /// Current bounding box. A detached or hidden element reports a
    /// zero-sized rect.
    async fn rect(&self) -> Rect;

    /// Parent element, if any.
    async fn parent(&self) -> Option<ElementRef>;

    /// Clicks the element. Fails if the handle has gone stale.
    async fn click(&self) -> Result<()>;

    /// Moves keyboard focus to the element.
    async fn focus(&self);

    /// Scrolls the element into the viewport.
    async fn scroll_into_view(&self);

    /// Whether the element can scroll its own content.
    async fn is_scrollable(&self) -> bool;

    /// Scrolls this element's content to the bottom.
    async fn scroll_to_bottom(&self);

    /// Whether the handle still points at a live element in the page.
    async fn is_connected(&self) -> bool;
}

impl std::fmt::Debug for dyn PageElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PageElement")
    }
}

// ============================================================================
// Page
// ============================================================================

/// The host page as a whole.
#[async_trait]
pub trait Page: Send + Sync {
    /// All elements matching `selector`, in document order.
    async fn query(&self, selector: &str) -> Vec<ElementRef>;

    /// First element matching `selector`.
    async fn query_first(&self, selector: &str) -> Option<ElementRef> {
        self.query(selector).await.into_iter().next()
    }

    /// Current location path (no origin, no query).
    async fn current_path(&self) -> String;

    /// Topmost element at the given page coordinates.
    async fn element_at(&self, x: f64, y: f64) -> Option<ElementRef>;

    /// Pushes a new location path without a full page load. Used as the last
    /// resort when re-asserting the pinned route.
    async fn push_route(&self, path: &str);

    /// Scrolls the window itself to the bottom.
    async fn scroll_window_to_bottom(&self);
}

// ============================================================================
// Tests
// ============================================================================
