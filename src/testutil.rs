//! Scripted page fakes for the test suite.
//!
//! [`FakePage`] holds a flat element list in document order. Selector
//! matching is by tag substring: each element carries tag strings, and it
//! matches a query whose selector contains one of its tags. Tests tag
//! elements with fragments unique to the production selector they should
//! answer to.
//!
//! Click hooks let a test script page reactions (show an overlay, change the
//! route, feed a URL into the interceptor) from inside an element's
//! `click()`.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::page::{ElementRef, Page, PageElement, Rect};

type ClickHook = Box<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;
type ScrollHook = Box<dyn Fn() + Send + Sync>;

/// Initialize tracing for a test. Safe to call from every test; only the
/// first call installs the subscriber.
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_test_writer()
        .try_init()
        .ok();
}

pub(crate) struct PageState {
    elements: Mutex<Vec<Arc<FakeElement>>>,
    path: Mutex<String>,
    clicks: Mutex<Vec<String>>,
    on_scroll: Mutex<Option<ScrollHook>>,
    next_id: AtomicU64,
}

// ============================================================================
// FakeElement
// ============================================================================

pub(crate) struct FakeElement {
    id: u64,
    name: String,
    parent: Option<u64>,
    tags: Vec<String>,
    text: Mutex<String>,
    attrs: Mutex<HashMap<String, String>>,
    rect: Mutex<Rect>,
    connected: AtomicBool,
    scrollable: AtomicBool,
    on_click: Mutex<Option<ClickHook>>,
    state: Weak<PageState>,
}

impl FakeElement {
    pub(crate) fn set_text(&self, text: &str) {
        *self.text.lock() = text.to_string();
    }

    pub(crate) fn set_attr(&self, name: &str, value: &str) {
        self.attrs.lock().insert(name.to_string(), value.to_string());
    }

    pub(crate) fn set_rect(&self, rect: Rect) {
        *self.rect.lock() = rect;
    }

    pub(crate) fn show(&self) {
        self.set_rect(Rect::new(0.0, 0.0, 400.0, 600.0));
    }

    pub(crate) fn hide(&self) {
        self.set_rect(Rect::default());
    }

    pub(crate) fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub(crate) fn set_scrollable(&self, scrollable: bool) {
        self.scrollable.store(scrollable, Ordering::SeqCst);
    }

    pub(crate) fn set_on_click<F, Fut>(&self, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        *self.on_click.lock() = Some(Box::new(move || Box::pin(hook())));
    }

    fn matches_selector(&self, selector: &str) -> bool {
        self.tags.iter().any(|tag| selector.contains(tag.as_str()))
    }

    fn is_descendant_of(&self, ancestor: u64, state: &PageState) -> bool {
        let elements = state.elements.lock();
        let by_id: HashMap<u64, &Arc<FakeElement>> =
            elements.iter().map(|e| (e.id, e)).collect();
        let mut current = self.parent;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = by_id.get(&id).and_then(|e| e.parent);
        }
        false
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn query(&self, selector: &str) -> Vec<ElementRef> {
        let Some(state) = self.state.upgrade() else {
            return Vec::new();
        };
        let elements: Vec<Arc<FakeElement>> = state.elements.lock().clone();
        elements
            .into_iter()
            .filter(|e| {
                e.connected.load(Ordering::SeqCst)
                    && e.matches_selector(selector)
                    && e.is_descendant_of(self.id, &state)
            })
            .map(|e| e as ElementRef)
            .collect()
    }

    async fn matches(&self, selector: &str) -> bool {
        self.matches_selector(selector)
    }

    async fn contains(&self, other: &ElementRef) -> bool {
        let Some(state) = self.state.upgrade() else {
            return false;
        };
        let elements: Vec<Arc<FakeElement>> = state.elements.lock().clone();
        // Recover the fake behind the trait object by address.
        for element in elements {
            if std::ptr::addr_eq(Arc::as_ptr(&element), Arc::as_ptr(other)) {
                return element.id == self.id || element.is_descendant_of(self.id, &state);
            }
        }
        false
    }

    async fn text(&self) -> String {
        self.text.lock().clone()
    }

    async fn attribute(&self, name: &str) -> Option<String> {
        self.attrs.lock().get(name).cloned()
    }

    async fn rect(&self) -> Rect {
        *self.rect.lock()
    }

    async fn parent(&self) -> Option<ElementRef> {
        let state = self.state.upgrade()?;
        let parent = self.parent?;
        let elements = state.elements.lock();
        elements
            .iter()
            .find(|e| e.id == parent)
            .map(|e| e.clone() as ElementRef)
    }

    async fn click(&self) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(Error::stale_element(self.name.clone()));
        }
        if let Some(state) = self.state.upgrade() {
            state.clicks.lock().push(self.name.clone());
        }
        let hook_future = self.on_click.lock().as_ref().map(|hook| hook());
        if let Some(future) = hook_future {
            future.await;
        }
        Ok(())
    }

    async fn focus(&self) {}

    async fn scroll_into_view(&self) {}

    async fn is_scrollable(&self) -> bool {
        self.scrollable.load(Ordering::SeqCst)
    }

    async fn scroll_to_bottom(&self) {
        if let Some(state) = self.state.upgrade()
            && let Some(hook) = state.on_scroll.lock().as_ref()
        {
            hook();
        }
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

// ============================================================================
// FakePage
// ============================================================================

#[derive(Clone)]
pub(crate) struct FakePage {
    state: Arc<PageState>,
}

impl FakePage {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            state: Arc::new(PageState {
                elements: Mutex::new(Vec::new()),
                path: Mutex::new(path.to_string()),
                clicks: Mutex::new(Vec::new()),
                on_scroll: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Appends an element in document order. `tags` are selector fragments
    /// the element should match; `name` shows up in the click log.
    pub(crate) fn add(
        &self,
        parent: Option<&Arc<FakeElement>>,
        name: &str,
        tags: &[&str],
    ) -> Arc<FakeElement> {
        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst);
        let element = Arc::new(FakeElement {
            id,
            name: name.to_string(),
            parent: parent.map(|p| p.id),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            text: Mutex::new(String::new()),
            attrs: Mutex::new(HashMap::new()),
            rect: Mutex::new(Rect::new(0.0, id as f64 * 30.0, 200.0, 24.0)),
            connected: AtomicBool::new(true),
            scrollable: AtomicBool::new(false),
            on_click: Mutex::new(None),
            state: Arc::downgrade(&self.state),
        });
        self.state.elements.lock().push(Arc::clone(&element));
        element
    }

    pub(crate) fn set_path(&self, path: &str) {
        *self.state.path.lock() = path.to_string();
    }

    pub(crate) fn clicks(&self) -> Vec<String> {
        self.state.clicks.lock().clone()
    }

    pub(crate) fn set_on_scroll<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.state.on_scroll.lock() = Some(Box::new(hook));
    }
}

#[async_trait]
impl Page for FakePage {
    async fn query(&self, selector: &str) -> Vec<ElementRef> {
        let elements: Vec<Arc<FakeElement>> = self.state.elements.lock().clone();
        elements
            .into_iter()
            .filter(|e| e.connected.load(Ordering::SeqCst) && e.matches_selector(selector))
            .map(|e| e as ElementRef)
            .collect()
    }

    async fn current_path(&self) -> String {
        self.state.path.lock().clone()
    }

    async fn element_at(&self, x: f64, y: f64) -> Option<ElementRef> {
        let elements: Vec<Arc<FakeElement>> = self.state.elements.lock().clone();
        elements
            .into_iter()
            .rev()
            .find(|e| {
                if !e.connected.load(Ordering::SeqCst) {
                    return false;
                }
                let rect = *e.rect.lock();
                rect.is_visible()
                    && x >= rect.x
                    && x <= rect.x + rect.width
                    && y >= rect.y
                    && y <= rect.y + rect.height
            })
            .map(|e| e as ElementRef)
    }

    async fn push_route(&self, path: &str) {
        self.set_path(path);
    }

    async fn scroll_window_to_bottom(&self) {
        if let Some(hook) = self.state.on_scroll.lock().as_ref() {
            hook();
        }
    }
}
