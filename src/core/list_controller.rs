//! Data controller behind every "list + search + delete + paginate" page.
//!
//! State is published through a `watch` channel so any rendering layer can
//! subscribe. Loads are ticketed: only the most recently issued load may
//! update the state, whatever order the responses arrive in.

use crate::api::models::{Entity, EntityId, Paginated, page_from_url};
use crate::api::resource::ResourceApi;
use crate::core::i18n::{Translate, scoped};
use crate::core::notifier::{Confirmation, Level, Notifier};
use crate::error::{AppError, ListError};
use crate::storage::download::DownloadSink;
use futures::future::{AbortHandle, Abortable};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Generic loading state for async data.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState<T> {
    /// Initial state, no data loaded yet
    #[default]
    Idle,
    /// Data is being fetched
    Loading,
    /// Data successfully loaded
    Loaded(T),
    /// Loading failed with error message
    Error(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadState::Error(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Everything a list page renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    pub status: LoadState<Paginated>,
    pub page: u32,
    pub query: String,
    /// Ids with a delete request on the wire; their delete action is disabled.
    pub deleting: HashSet<EntityId>,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            status: LoadState::Idle,
            page: 1,
            query: String::new(),
            deleting: HashSet::new(),
        }
    }
}

impl ListState {
    /// Rows of the current page; empty unless loaded.
    pub fn entities(&self) -> &[Entity] {
        self.status
            .data()
            .map(|page| page.data.as_slice())
            .unwrap_or(&[])
    }

    /// `(from, to, total)` of the loaded page.
    pub fn pagination(&self) -> Option<(u64, u64, u64)> {
        self.status
            .data()
            .map(|page| (page.from, page.to, page.total))
    }

    pub fn is_deleting(&self, id: &EntityId) -> bool {
        self.deleting.contains(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response (or failure) was written to the state.
    Applied,
    /// A newer load or `close` made this response irrelevant.
    Superseded,
}

#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted,
    /// The user declined the confirmation; nothing was sent.
    Cancelled,
    /// A delete for the same id is still running.
    InFlight,
    /// The server rejected the delete; the list is left untouched.
    Failed(AppError),
}

#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Quiet period after the last search keystroke. Zero loads immediately.
    pub debounce: Duration,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Parse a page indicator: a bare page number or a paginator link URL.
pub fn parse_page_token(token: &str) -> Option<u32> {
    let token = token.trim();
    token
        .parse::<u32>()
        .ok()
        .filter(|page| *page > 0)
        .or_else(|| page_from_url(token))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The most recently issued load and the handle that cancels it. Both change
/// together so a newer ticket always owns the abort handle.
#[derive(Default)]
struct InFlight {
    ticket: u64,
    abort: Option<AbortHandle>,
}

struct Inner {
    api: Arc<dyn ResourceApi>,
    notifier: Arc<dyn Notifier>,
    translator: Arc<dyn Translate>,
    debounce: Duration,
    state: watch::Sender<ListState>,
    closed: AtomicBool,
    in_flight: Mutex<InFlight>,
    pending_search: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn t(&self, key: &str) -> String {
        scoped(self.translator.as_ref(), self.api.resource(), key)
    }

    fn ensure_open(&self) -> Result<(), ListError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(ListError::Closed)
        } else {
            Ok(())
        }
    }

    fn is_current(&self, ticket: u64) -> bool {
        !self.closed.load(Ordering::SeqCst) && lock(&self.in_flight).ticket == ticket
    }

    async fn load(&self, page: u32, query: String) -> Result<LoadOutcome, ListError> {
        self.ensure_open()?;
        let page = page.max(1);
        let (abort_handle, registration) = AbortHandle::new_pair();
        let ticket = {
            let mut in_flight = lock(&self.in_flight);
            in_flight.ticket += 1;
            if let Some(previous) = in_flight.abort.replace(abort_handle) {
                previous.abort();
            }
            in_flight.ticket
        };

        let started = self.state.send_if_modified(|state| {
            if !self.is_current(ticket) {
                return false;
            }
            state.page = page;
            state.query = query.clone();
            state.status = LoadState::Loading;
            true
        });
        if !started {
            return Ok(LoadOutcome::Superseded);
        }

        let query_param = Some(query.as_str()).filter(|q| !q.is_empty());
        let request = self.api.list_paginated(page, query_param);
        let result = match Abortable::new(request, registration).await {
            Ok(result) => result,
            Err(_aborted) => {
                log::debug!(
                    "{} page {} load superseded before completion",
                    self.api.resource(),
                    page
                );
                return Ok(LoadOutcome::Superseded);
            }
        };

        if let Err(err) = &result {
            log::warn!("failed to load {} page {}: {}", self.api.resource(), page, err);
        }
        let fetch_error = self.t("fetch_error");

        let applied = self.state.send_if_modified(|state| {
            if !self.is_current(ticket) {
                return false;
            }
            state.status = match result {
                Ok(data) => LoadState::Loaded(data),
                Err(err) => LoadState::Error(format!("{}: {}", fetch_error, err.display_friendly())),
            };
            true
        });

        if applied {
            Ok(LoadOutcome::Applied)
        } else {
            log::debug!("discarding stale {} page {} response", self.api.resource(), page);
            Ok(LoadOutcome::Superseded)
        }
    }

    fn cancel_pending(&self) {
        if let Some(timer) = lock(&self.pending_search).take() {
            timer.abort();
        }
        if let Some(request) = lock(&self.in_flight).abort.take() {
            request.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

/// Handle to a list page's controller. Clones share the same state.
#[derive(Clone)]
pub struct ListController {
    inner: Arc<Inner>,
}

impl ListController {
    pub fn new(
        api: Arc<dyn ResourceApi>,
        notifier: Arc<dyn Notifier>,
        translator: Arc<dyn Translate>,
        options: ListOptions,
    ) -> Self {
        let (state, _) = watch::channel(ListState::default());
        Self {
            inner: Arc::new(Inner {
                api,
                notifier,
                translator,
                debounce: options.debounce,
                state,
                closed: AtomicBool::new(false),
                in_flight: Mutex::new(InFlight::default()),
                pending_search: Mutex::new(None),
            }),
        }
    }

    pub fn resource(&self) -> &str {
        self.inner.api.resource()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> ListState {
        self.inner.state.borrow().clone()
    }

    /// Initial fetch when the page is shown.
    pub async fn mount(&self) -> Result<LoadOutcome, ListError> {
        self.inner.load(1, String::new()).await
    }

    /// Load `page` for `query`, superseding any load still in flight.
    pub async fn load(&self, page: u32, query: &str) -> Result<LoadOutcome, ListError> {
        self.inner.load(page, query.to_string()).await
    }

    /// Reload the current page and query, e.g. to retry after an error.
    pub async fn refresh(&self) -> Result<LoadOutcome, ListError> {
        let (page, query) = self.current_position();
        self.inner.load(page, query).await
    }

    /// Record a new search term and schedule a load of its first page once
    /// the debounce window passes without another term arriving.
    pub fn search(&self, term: &str) -> Result<(), ListError> {
        self.inner.ensure_open()?;
        let term = term.trim().to_string();
        self.inner.state.send_modify(|state| state.query = term.clone());

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.debounce;
        let timer = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(inner) = weak.upgrade() {
                let _ = inner.load(1, term).await;
            }
        });

        if let Some(previous) = lock(&self.inner.pending_search).replace(timer) {
            previous.abort();
        }
        Ok(())
    }

    /// Wait for a scheduled search load, if any, to finish.
    pub async fn settle(&self) {
        let timer = lock(&self.inner.pending_search).take();
        if let Some(timer) = timer {
            let _ = timer.await;
        }
    }

    /// Jump to the page named by `token` (`"3"` or a paginator link URL).
    pub async fn change_page(&self, token: &str) -> Result<LoadOutcome, ListError> {
        let page = parse_page_token(token).ok_or_else(|| ListError::InvalidPageToken {
            token: token.to_string(),
        })?;
        let (_, query) = self.current_position();
        self.inner.load(page, query).await
    }

    /// Follow the paginator's "next" link. `None` on the last page.
    pub async fn next_page(&self) -> Result<Option<LoadOutcome>, ListError> {
        let next = self.inner.state.borrow().status.data().and_then(Paginated::next_page);
        match next {
            Some(page) => self.change_page(&page.to_string()).await.map(Some),
            None => Ok(None),
        }
    }

    /// Follow the paginator's "previous" link. `None` on the first page.
    pub async fn previous_page(&self) -> Result<Option<LoadOutcome>, ListError> {
        let previous = self
            .inner
            .state
            .borrow()
            .status
            .data()
            .and_then(Paginated::previous_page);
        match previous {
            Some(page) => self.change_page(&page.to_string()).await.map(Some),
            None => Ok(None),
        }
    }

    /// Confirm with the user, delete `id`, then reload the current page.
    ///
    /// Sends at most one request per confirmed action and never retries. On
    /// failure the list is left as it was and the user is alerted.
    pub async fn request_delete(&self, id: EntityId) -> Result<DeleteOutcome, ListError> {
        let inner = &self.inner;
        inner.ensure_open()?;
        if inner.state.borrow().is_deleting(&id) {
            return Ok(DeleteOutcome::InFlight);
        }

        let confirmation = Confirmation {
            title: inner.t("confirm_delete"),
            confirm_label: inner.t("delete"),
            cancel_label: inner.t("cancel"),
        };
        if !inner.notifier.confirm(&confirmation).await {
            return Ok(DeleteOutcome::Cancelled);
        }

        let claimed = inner
            .state
            .send_if_modified(|state| state.deleting.insert(id.clone()));
        if !claimed {
            return Ok(DeleteOutcome::InFlight);
        }

        let result = inner.api.delete_by_id(&id).await;
        inner.state.send_modify(|state| {
            state.deleting.remove(&id);
        });

        match result {
            Ok(()) => {
                log::info!("deleted {} {}", inner.api.resource(), id);
                inner.notifier.toast(Level::Success, &inner.t("delete_success"));
                if inner.ensure_open().is_ok() {
                    self.refresh().await?;
                }
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                log::warn!("failed to delete {} {}: {}", inner.api.resource(), id, err);
                inner.notifier.alert(
                    Level::Error,
                    &inner.t("delete_error"),
                    Some(&err.display_friendly()),
                );
                Ok(DeleteOutcome::Failed(err))
            }
        }
    }

    /// Download the resource's PDF report, keeping the user informed.
    pub async fn export_pdf(&self, sink: &dyn DownloadSink) -> crate::Result<PathBuf> {
        let inner = &self.inner;
        inner.notifier.toast(Level::Info, &inner.t("generating_pdf"));
        match inner.api.export_pdf(sink).await {
            Ok(path) => {
                inner.notifier.alert(
                    Level::Success,
                    &inner.t("pdf_success"),
                    Some(&path.display().to_string()),
                );
                Ok(path)
            }
            Err(err) => {
                inner.notifier.alert(
                    Level::Error,
                    &inner.t("pdf_error"),
                    Some(&err.display_friendly()),
                );
                Err(err)
            }
        }
    }

    /// Stop the controller: pending timers and requests are cancelled and
    /// no later response is applied.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.cancel_pending();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn current_position(&self) -> (u32, String) {
        let state = self.inner.state.borrow();
        (state.page, state.query.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_page_token() {
        assert_eq!(parse_page_token("3"), Some(3));
        assert_eq!(parse_page_token(" 12 "), Some(12));
        assert_eq!(parse_page_token("0"), None);
        assert_eq!(
            parse_page_token("http://api.test/api/products/paginated?page=4"),
            Some(4)
        );
        assert_eq!(parse_page_token("next"), None);
        assert_eq!(parse_page_token(""), None);
    }

    #[test]
    fn test_load_state_accessors() {
        let state: LoadState<u32> = LoadState::Loaded(3);
        assert!(state.is_loaded());
        assert_eq!(state.data(), Some(&3));
        assert!(state.error().is_none());

        let state: LoadState<u32> = LoadState::Error("boom".to_string());
        assert!(state.is_error());
        assert_eq!(state.error(), Some("boom"));
        assert!(LoadState::<u32>::default() == LoadState::Idle);
    }

    #[test]
    fn test_list_state_views() {
        let page: Paginated = serde_json::from_value(json!({
            "data": [{"id": 1}, {"id": 2}],
            "from": 1,
            "to": 2,
            "total": 9
        }))
        .unwrap();

        let mut state = ListState::default();
        assert!(state.entities().is_empty());
        assert_eq!(state.pagination(), None);

        state.status = LoadState::Loaded(page);
        assert_eq!(state.entities().len(), 2);
        assert_eq!(state.pagination(), Some((1, 2, 9)));

        state.deleting.insert(EntityId::Int(2));
        assert!(state.is_deleting(&EntityId::Int(2)));
        assert!(!state.is_deleting(&EntityId::Int(1)));
    }
}
