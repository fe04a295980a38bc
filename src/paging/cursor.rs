//! Page cursor state machine for infinite lists.
//!
//! Pure and synchronous: every transition that needs data hands back a
//! [`PageRequest`] for the caller to execute, and the response is fed back
//! through [`PagedFetchController::resolve`]. Requests carry a generation;
//! only the latest issued generation may touch the buffer.

use crate::api::{ApiError, ListParams};
use crate::model::Paginated;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub current_page: u32,
    pub last_page: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            current_page: 1,
            last_page: 1,
        }
    }
}

impl PageCursor {
    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    fn settle(&mut self, current_page: u32, last_page: u32) {
        self.last_page = last_page.max(1);
        self.current_page = current_page.clamp(1, self.last_page);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Idle,
    /// First page of a fresh query (open, term or filter change) or a refresh.
    Loading,
    FetchingNext,
    FetchingPrev,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollEdge {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Reset,
    Next,
    Prev,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub kind: RequestKind,
    pub params: ListParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    /// A newer request was issued (or the list was closed) in the meantime.
    Stale,
    Failed,
}

pub struct PagedFetchController<T> {
    enabled: bool,
    term: String,
    filters: Vec<(String, String)>,
    per_page: Option<u32>,
    cursor: PageCursor,
    state: CursorState,
    buffer: Vec<T>,
    generation: u64,
    /// A term or filter change whose first page has not landed yet.
    pending_reset: bool,
    last_error: Option<ApiError>,
}

impl<T> Default for PagedFetchController<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PagedFetchController<T> {
    pub fn new() -> Self {
        Self {
            enabled: false,
            term: String::new(),
            filters: Vec::new(),
            per_page: None,
            cursor: PageCursor::default(),
            state: CursorState::Idle,
            buffer: Vec::new(),
            generation: 0,
            pending_reset: false,
            last_error: None,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn items(&self) -> &[T] {
        &self.buffer
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    /// Start fetching. Issues the first page if the list was disabled.
    pub fn enable(&mut self) -> Option<PageRequest> {
        if self.enabled {
            return None;
        }
        self.enabled = true;
        Some(self.issue(RequestKind::Reset, 1))
    }

    /// Stop fetching, drop the buffer and orphan anything in flight.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.generation += 1;
        self.pending_reset = false;
        self.cursor = PageCursor::default();
        self.state = CursorState::Idle;
        self.buffer.clear();
        self.last_error = None;
    }

    /// A new term restarts pagination at page 1.
    pub fn set_term(&mut self, term: impl Into<String>) -> Option<PageRequest> {
        let term = term.into();
        if term == self.term {
            return None;
        }
        self.term = term;
        self.restart()
    }

    /// Set (or replace) a fixed filter. Changing it restarts pagination.
    pub fn set_filter(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<PageRequest> {
        let (key, value) = (key.into(), value.into());
        match self.filters.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) if *existing == value => return None,
            Some((_, existing)) => *existing = value,
            None => self.filters.push((key, value)),
        }
        self.restart()
    }

    /// Fetch the neighbouring page. Ignored while a page is in flight or
    /// while the buffer still belongs to a previous term.
    pub fn scroll(&mut self, edge: ScrollEdge) -> Option<PageRequest> {
        if !self.enabled
            || self.pending_reset
            || matches!(
                self.state,
                CursorState::Loading | CursorState::FetchingNext | CursorState::FetchingPrev
            )
        {
            return None;
        }
        match edge {
            ScrollEdge::Bottom if self.cursor.has_next() => {
                Some(self.issue(RequestKind::Next, self.cursor.current_page + 1))
            }
            ScrollEdge::Top if self.cursor.has_prev() => {
                Some(self.issue(RequestKind::Prev, self.cursor.current_page - 1))
            }
            _ => None,
        }
    }

    /// Re-request the current page, or retry page 1 after a failed restart.
    pub fn refresh(&mut self) -> Option<PageRequest> {
        if !self.enabled {
            return None;
        }
        if self.pending_reset {
            return Some(self.issue(RequestKind::Reset, 1));
        }
        Some(self.issue(RequestKind::Refresh, self.cursor.current_page))
    }

    /// Feed back the outcome of `generation`'s request.
    pub fn resolve(
        &mut self,
        generation: u64,
        outcome: Result<Paginated<T>, ApiError>,
    ) -> Resolution {
        if generation != self.generation || !self.enabled {
            tracing::debug!(
                "discarding page response of generation {generation} (latest {})",
                self.generation
            );
            return Resolution::Stale;
        }

        match outcome {
            Ok(page) => {
                self.cursor.settle(page.meta.current_page, page.meta.last_page);
                self.buffer = page.data;
                self.state = CursorState::Idle;
                self.pending_reset = false;
                self.last_error = None;
                Resolution::Applied
            }
            Err(e) => {
                tracing::warn!("page fetch failed: {e}");
                self.state = CursorState::Error;
                self.last_error = Some(e);
                Resolution::Failed
            }
        }
    }

    /// The buffer and cursor stay on screen until page 1 of the new query
    /// is applied.
    fn restart(&mut self) -> Option<PageRequest> {
        if !self.enabled {
            // Orphan anything still in flight from the previous query.
            self.generation += 1;
            return None;
        }
        self.pending_reset = true;
        Some(self.issue(RequestKind::Reset, 1))
    }

    fn issue(&mut self, kind: RequestKind, page: u32) -> PageRequest {
        self.generation += 1;
        self.state = match kind {
            RequestKind::Reset | RequestKind::Refresh => CursorState::Loading,
            RequestKind::Next => CursorState::FetchingNext,
            RequestKind::Prev => CursorState::FetchingPrev,
        };

        let mut params = ListParams::new().search(self.term.clone()).page(page);
        if let Some(per_page) = self.per_page {
            params = params.per_page(per_page);
        }
        for (key, value) in &self.filters {
            params = params.filter(key.clone(), value.clone());
        }

        PageRequest {
            generation: self.generation,
            kind,
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageMeta;
    use pretty_assertions::assert_eq;

    fn page(current: u32, last: u32, items: &[&str]) -> Result<Paginated<String>, ApiError> {
        Ok(Paginated {
            data: items.iter().map(|s| s.to_string()).collect(),
            meta: PageMeta {
                current_page: current,
                last_page: last,
                per_page: None,
                total: None,
            },
        })
    }

    /// Controller enabled and settled on `current` of `last`.
    fn settled_at(current: u32, last: u32) -> PagedFetchController<String> {
        let mut c = PagedFetchController::new();
        let first = c.enable().unwrap();
        assert_eq!(c.resolve(first.generation, page(current, last, &["a"])), Resolution::Applied);
        c
    }

    #[test]
    fn test_disabled_controller_issues_nothing() {
        let mut c = PagedFetchController::<String>::new();
        assert_eq!(c.set_term("joao"), None);
        assert_eq!(c.scroll(ScrollEdge::Bottom), None);
        assert_eq!(c.refresh(), None);

        let first = c.enable().unwrap();
        assert_eq!(first.kind, RequestKind::Reset);
        assert_eq!(first.params, ListParams::new().search("joao"));
        assert_eq!(c.enable(), None);
    }

    #[test]
    fn test_bottom_scroll_advances_only_when_more_pages_exist() {
        let mut c = settled_at(3, 5);
        let next = c.scroll(ScrollEdge::Bottom).unwrap();
        assert_eq!(next.kind, RequestKind::Next);
        assert_eq!(next.params.page, 4);
        assert_eq!(c.state(), CursorState::FetchingNext);
        // The cursor only moves once the page arrives.
        assert_eq!(c.cursor().current_page, 3);
        assert_eq!(c.resolve(next.generation, page(4, 5, &["d"])), Resolution::Applied);
        assert_eq!(c.cursor().current_page, 4);

        let mut c = settled_at(5, 5);
        assert_eq!(c.scroll(ScrollEdge::Bottom), None);
        assert_eq!(c.cursor().current_page, 5);
        assert_eq!(c.state(), CursorState::Idle);
    }

    #[test]
    fn test_top_scroll_retreats_but_never_below_one() {
        let mut c = settled_at(1, 5);
        assert_eq!(c.scroll(ScrollEdge::Top), None);

        let mut c = settled_at(2, 5);
        let prev = c.scroll(ScrollEdge::Top).unwrap();
        assert_eq!(prev.params.page, 1);
        assert_eq!(c.state(), CursorState::FetchingPrev);
    }

    #[test]
    fn test_scroll_is_ignored_while_a_page_is_in_flight() {
        let mut c = settled_at(1, 5);
        assert!(c.scroll(ScrollEdge::Bottom).is_some());
        assert_eq!(c.scroll(ScrollEdge::Bottom), None);
    }

    #[test]
    fn test_term_change_resets_to_first_page() {
        let mut c = settled_at(3, 5);
        let reset = c.set_term("maria").unwrap();
        assert_eq!(reset.params.page, 1);
        assert_eq!(reset.params.q, "maria");
        assert_eq!(c.set_term("maria"), None);

        assert_eq!(c.resolve(reset.generation, page(1, 2, &["m"])), Resolution::Applied);
        assert_eq!(
            c.cursor(),
            PageCursor {
                current_page: 1,
                last_page: 2
            }
        );
        assert_eq!(c.items(), ["m".to_string()]);
    }

    #[test]
    fn test_failed_term_change_keeps_previous_page() {
        let mut c = settled_at(2, 3);
        let reset = c.set_term("joao").unwrap();
        // Old results stay visible while page 1 of the new term loads.
        assert_eq!(c.items(), ["a".to_string()]);

        let outcome = c.resolve(reset.generation, Err(ApiError::Transport("reset".to_string())));
        assert_eq!(outcome, Resolution::Failed);
        assert_eq!(c.state(), CursorState::Error);
        assert_eq!(c.items(), ["a".to_string()]);
        assert_eq!(
            c.cursor(),
            PageCursor {
                current_page: 2,
                last_page: 3
            }
        );

        // No page 3 of "joao" on top of page 2 of the old term.
        assert_eq!(c.scroll(ScrollEdge::Bottom), None);
        let retry = c.refresh().unwrap();
        assert_eq!(retry.kind, RequestKind::Reset);
        assert_eq!(retry.params.page, 1);
        assert_eq!(retry.params.q, "joao");
        assert_eq!(c.resolve(retry.generation, page(1, 1, &["joao"])), Resolution::Applied);
        assert_eq!(c.items(), ["joao".to_string()]);
        assert!(c.scroll(ScrollEdge::Bottom).is_none());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut c = PagedFetchController::<String>::new();
        c.enable();
        let x = c.set_term("x").unwrap();
        let y = c.set_term("y").unwrap();

        assert_eq!(c.resolve(x.generation, page(1, 1, &["xavier"])), Resolution::Stale);
        assert!(c.items().is_empty());
        assert_eq!(c.resolve(y.generation, page(1, 1, &["yasmin"])), Resolution::Applied);
        assert_eq!(c.items(), ["yasmin".to_string()]);
    }

    #[test]
    fn test_disable_orphans_in_flight_request() {
        let mut c = PagedFetchController::<String>::new();
        let first = c.enable().unwrap();
        c.disable();
        assert_eq!(c.resolve(first.generation, page(1, 1, &["a"])), Resolution::Stale);
        assert!(c.items().is_empty());
        assert_eq!(c.state(), CursorState::Idle);
    }

    #[test]
    fn test_failure_keeps_buffer_and_cursor() {
        let mut c = settled_at(2, 5);
        let next = c.scroll(ScrollEdge::Bottom).unwrap();
        let outcome = c.resolve(next.generation, Err(ApiError::Transport("reset".to_string())));

        assert_eq!(outcome, Resolution::Failed);
        assert_eq!(c.state(), CursorState::Error);
        assert_eq!(c.cursor().current_page, 2);
        assert_eq!(c.items(), ["a".to_string()]);
        assert!(c.last_error().is_some());

        // A retry is allowed from the error state.
        assert!(c.scroll(ScrollEdge::Bottom).is_some());
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut c = settled_at(2, 3);
        let before = c.items().to_vec();
        for _ in 0..2 {
            let again = c.refresh().unwrap();
            assert_eq!(again.params.page, 2);
            c.resolve(again.generation, page(2, 3, &["a"]));
            assert_eq!(c.items(), before.as_slice());
            assert_eq!(c.cursor().current_page, 2);
        }
    }

    #[test]
    fn test_cursor_is_clamped_to_last_page() {
        let mut c = PagedFetchController::<String>::new();
        let first = c.enable().unwrap();
        c.resolve(first.generation, page(7, 4, &[]));
        assert_eq!(
            c.cursor(),
            PageCursor {
                current_page: 4,
                last_page: 4
            }
        );
    }

    #[test]
    fn test_filters_and_page_size_are_sent() {
        let mut c = PagedFetchController::<String>::new()
            .with_per_page(10)
            .with_filter("status", "active");
        let first = c.enable().unwrap();
        assert_eq!(
            first.params,
            ListParams::new().per_page(10).filter("status", "active")
        );
        assert_eq!(c.set_filter("status", "active"), None);
        let changed = c.set_filter("status", "inactive").unwrap();
        assert_eq!(changed.params.filters, vec![("status".to_string(), "inactive".to_string())]);
    }
}
