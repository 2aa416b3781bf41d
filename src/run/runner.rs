//! The run orchestrator.
//!
//! A [`Runner`] drives one batch download pass over the timeline: resolve
//! the date range, pin the route, preload the list, then visit every item in
//! order, opening its overlay and clicking each document action through the
//! interceptor. Configuration is a snapshot taken at construction; the only
//! live inputs during a run are the page itself and the stop flag.
//!
//! Degradation policy: anything that breaks a single item (no overlay, a
//! stale element, a failed click) skips that item with a warning. Only a
//! lost session or route aborts the run.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Datelike, NaiveDate};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::intercept::{DownloadInterceptor, PendingDownloadMeta};
use crate::overlay;
use crate::page::Page;
use crate::run::range::RunRange;
use crate::run::status::{RunOutcome, Status};
use crate::scroll;
use crate::timeline::{self, DocAction, ItemContext};

// ============================================================================
// StopHandle
// ============================================================================

/// Cooperative stop flag for a running pass.
///
/// Stopping is honored at item and document boundaries; the current page
/// interaction always finishes so the page is never left mid-gesture.
#[derive(Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests the run to stop.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Drives one batch download pass.
pub struct Runner {
    page: Arc<dyn Page>,
    interceptor: Arc<DownloadInterceptor>,
    config: Arc<Config>,
    status_tx: watch::Sender<Status>,
    stop: Arc<AtomicBool>,
}

impl Runner {
    /// Creates a runner over the injected page and interceptor.
    pub fn new(
        page: Arc<dyn Page>,
        interceptor: Arc<DownloadInterceptor>,
        config: Arc<Config>,
    ) -> Self {
        let (status_tx, _status_rx) = watch::channel(Status::Idle);
        Self {
            page,
            interceptor,
            config,
            status_tx,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribes to status updates.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<Status> {
        self.status_tx.subscribe()
    }

    /// Handle for requesting a cooperative stop.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// The interceptor this runner arms.
    #[inline]
    #[must_use]
    pub fn interceptor(&self) -> &Arc<DownloadInterceptor> {
        &self.interceptor
    }

    /// Runs a pass using the configured range inputs and the current date.
    pub async fn run(&self) -> Result<RunOutcome> {
        let today = chrono::Local::now().date_naive();
        let from = self.config.range_from.clone();
        let to = self.config.range_to.clone();
        self.run_range(&from, &to, today).await
    }

    /// Runs a pass over `from..to`, with `today` as the reference date for
    /// the "today" sentinel and year fallbacks.
    pub async fn run_range(&self, from: &str, to: &str, today: NaiveDate) -> Result<RunOutcome> {
        self.stop.store(false, Ordering::SeqCst);
        self.config.validate()?;
        self.publish(Status::Searching);

        let range = match RunRange::resolve(from, to, today) {
            Ok(range) => range,
            Err(err) => {
                if let Error::InvalidDate { field, value } = &err {
                    self.publish(Status::InvalidDate {
                        field: field.clone(),
                        value: value.clone(),
                    });
                }
                return Err(err);
            }
        };

        // Pin the route to wherever the run starts.
        let start_path = self.page.current_path().await;
        if !self.config.routes.is_timeline_path(&start_path) {
            return Err(Error::route_lost(start_path));
        }
        let desired_route = self.config.routes.desired_for_path(&start_path);
        info!(route = %desired_route, "Starting run");

        let selectors = &self.config.selectors;
        let mut items = timeline::list_items(self.page.as_ref(), selectors).await;
        if items.is_empty() {
            self.publish(Status::NoEntries);
            return Ok(RunOutcome::NoMatches);
        }

        if self.config.auto_load_more {
            loop {
                if self.stop_requested() {
                    break;
                }
                if let Some(lower) = range.lower()
                    && let Some(last) =
                        timeline::last_item_date(self.page.as_ref(), selectors, today.year()).await
                    && last < lower
                {
                    debug!(last = %last, "Loaded past the lower bound");
                    break;
                }
                let count = items.len();
                self.publish(Status::LoadingMore { loaded: count });
                scroll::load_more(self.page.as_ref(), &self.config).await;
                items = timeline::list_items(self.page.as_ref(), selectors).await;
                if items.len() <= count {
                    break;
                }
            }
        }

        let total = items.len();
        self.publish(Status::Filtering { total });

        let mut matched = 0usize;
        for index in 0..total {
            let display_index = index + 1;
            if self.stop_requested() {
                return self.abort(display_index);
            }

            self.check_session(display_index, total).await?;
            self.ensure_active_route(&desired_route).await?;

            // Re-query: the list may have re-rendered since the last item.
            let current = timeline::list_items(self.page.as_ref(), selectors).await;
            let Some(item) = current.get(index).cloned() else {
                warn!(item = display_index, "Item list shrank, stopping early");
                break;
            };

            let mut context = timeline::item_context(self.page.as_ref(), &item, selectors).await;
            if let Some(date) = context.resolved_date(today.year())
                && !range.contains(date)
            {
                debug!(item = display_index, date = %date, "Outside range, skipping");
                continue;
            }
            // Undated items are always processed.
            matched += 1;

            self.publish(Status::OpeningItem { index: display_index, total });
            let overlay_el =
                match overlay::open_for_item(self.page.as_ref(), &item, display_index, &self.config)
                    .await
                {
                    Ok(element) => element,
                    Err(err) if err.is_recoverable() => {
                        warn!(item = display_index, error = %err, "No overlay, skipping item");
                        self.publish(Status::NoOverlay { index: display_index });
                        continue;
                    }
                    Err(err) => return Err(err),
                };

            let (modal_year, modal_hour, modal_minute) =
                timeline::modal_time_info(&overlay_el, selectors).await;
            context.modal_year = modal_year;
            context.modal_hour = modal_hour;
            context.modal_minute = modal_minute;

            let actions = timeline::document_actions(&overlay_el, selectors).await;
            self.publish(Status::OpeningDocuments {
                index: display_index,
                count: actions.len(),
            });

            let doc_total = actions.len();
            for (doc_index, action) in actions.into_iter().enumerate() {
                if self.stop_requested() {
                    break;
                }
                self.interceptor
                    .arm(meta_for(&context, &action, doc_index + 1, doc_total));
                action.element.focus().await;
                tokio::time::sleep(self.config.pace().focus_delay).await;
                if let Err(err) = action.element.click().await {
                    warn!(item = display_index, doc = doc_index + 1, error = %err, "Document click failed");
                    self.interceptor.clear();
                }
                tokio::time::sleep(self.config.pace().doc_click_gap).await;
            }

            self.publish(Status::ClosingOverlay { index: display_index });
            overlay::close(self.page.as_ref(), &overlay_el, &self.config).await;
            tokio::time::sleep(self.config.pace().close_settle).await;

            self.publish(Status::ItemDone {
                index: display_index,
                matched,
            });
            tokio::time::sleep(self.config.pace().item_pace).await;
        }

        if self.stop_requested() {
            return self.abort(total);
        }

        let documents = self.interceptor.downloads_completed();
        if matched == 0 {
            self.publish(Status::NoMatches);
            return Ok(RunOutcome::NoMatches);
        }
        self.publish(Status::Done { matched, documents });
        Ok(RunOutcome::Completed { matched, documents })
    }

    fn abort(&self, index: usize) -> Result<RunOutcome> {
        self.publish(Status::StopRequested);
        self.publish(Status::Aborted { index });
        Ok(RunOutcome::Aborted { index })
    }

    /// The session is alive when the page is on a timeline route and the
    /// timeline root is still rendered. Loss is fatal for the run.
    async fn check_session(&self, index: usize, total: usize) -> Result<()> {
        let path = self.page.current_path().await;
        let root_alive = match self
            .page
            .query_first(&self.config.selectors.timeline_root)
            .await
        {
            Some(root) => root.is_connected().await,
            None => false,
        };
        if self.config.routes.is_timeline_path(&path) && root_alive {
            return Ok(());
        }
        warn!(path = %path, item = index, "Session lost");
        self.publish(Status::SessionLost { index, total });
        Err(Error::session_lost(index, total))
    }

    /// Brings the page back to the pinned route if it drifted. Idempotent
    /// when the route is already right.
    async fn ensure_active_route(&self, desired: &str) -> Result<()> {
        if !self.config.lock_tab {
            return Ok(());
        }
        let current = self.page.current_path().await;
        if current == desired {
            return Ok(());
        }

        info!(current = %current, desired = %desired, "Re-asserting route");
        if !self.click_route_tab(desired).await {
            self.page.push_route(desired).await;
        }
        tokio::time::sleep(self.config.timings.route_fix).await;

        let current = self.page.current_path().await;
        if current == desired {
            Ok(())
        } else {
            Err(Error::route_lost(current))
        }
    }

    /// Tries the visible tab control for `desired`, by href or label.
    async fn click_route_tab(&self, desired: &str) -> bool {
        let label = self.config.routes.label_for(desired);
        for candidate in self.page.query(&self.config.selectors.route_tab).await {
            let by_href = candidate
                .attribute("href")
                .await
                .is_some_and(|href| href.ends_with(desired));
            if by_href || candidate.text().await.contains(label) {
                return candidate.click().await.is_ok();
            }
        }
        false
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn publish(&self, status: Status) {
        debug!(status = %status, "Run status");
        let _ = self.status_tx.send(status);
    }
}

/// Snapshot of everything the filename builder will need, taken at the
/// moment the document action is armed.
fn meta_for(
    context: &ItemContext,
    action: &DocAction,
    doc_index: usize,
    doc_total: usize,
) -> PendingDownloadMeta {
    PendingDownloadMeta {
        doc_title: Some(action.title.clone()),
        doc_date: action.date.clone(),
        doc_index,
        doc_total,
        item_title: context.title.clone(),
        item_date: context.date_fragment.clone(),
        item_subtitle: context.subtitle.clone(),
        item_year: context.year,
        modal_year: context.modal_year,
        modal_hour: context.modal_hour,
        modal_minute: context.modal_minute,
    }
}

// ============================================================================
// Tests
// ============================================================================
