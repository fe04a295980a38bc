//! Async driver around [`PagedFetchController`].

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::cursor::{
    CursorState, PageCursor, PageRequest, PagedFetchController, Resolution, ScrollEdge,
};
use crate::api::{ApiError, ListParams};
use crate::bus::event_types::MSG_FETCH_FAILED;
use crate::bus::EventBus;
use crate::model::Paginated;

/// Where pages come from. Implemented over the API client for real lists and
/// by fakes in tests.
#[async_trait]
pub trait PageSource<T: Send + 'static>: Send + Sync {
    async fn fetch(&self, params: &ListParams) -> Result<Paginated<T>, ApiError>;
}

pub struct InfiniteList<T, S> {
    source: S,
    controller: Mutex<PagedFetchController<T>>,
    bus: Option<Arc<EventBus>>,
}

impl<T, S> InfiniteList<T, S>
where
    T: Clone + Send + 'static,
    S: PageSource<T>,
{
    pub fn new(source: S, controller: PagedFetchController<T>) -> Self {
        Self {
            source,
            controller: Mutex::new(controller),
            bus: None,
        }
    }

    /// Surface failed fetches as error toasts on `bus`.
    pub fn with_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    fn lock(&self) -> MutexGuard<'_, PagedFetchController<T>> {
        self.controller.lock().expect("page controller poisoned")
    }

    pub fn items(&self) -> Vec<T> {
        self.lock().items().to_vec()
    }

    pub fn cursor(&self) -> PageCursor {
        self.lock().cursor()
    }

    pub fn state(&self) -> CursorState {
        self.lock().state()
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().is_enabled()
    }

    /// Enable the list on `term`, fetching its first page unless that exact
    /// query is already showing.
    pub async fn open(&self, term: impl Into<String>) -> Option<Resolution> {
        let request = {
            let mut controller = self.lock();
            let reset = controller.set_term(term);
            let enabled = controller.enable();
            enabled.or(reset)
        };
        self.run(request).await
    }

    pub fn close(&self) {
        self.lock().disable();
    }

    pub async fn set_term(&self, term: impl Into<String>) -> Option<Resolution> {
        let request = self.lock().set_term(term);
        self.run(request).await
    }

    pub async fn scroll(&self, edge: ScrollEdge) -> Option<Resolution> {
        let request = self.lock().scroll(edge);
        self.run(request).await
    }

    pub async fn refresh(&self) -> Option<Resolution> {
        let request = self.lock().refresh();
        self.run(request).await
    }

    async fn run(&self, request: Option<PageRequest>) -> Option<Resolution> {
        let request = request?;
        tracing::debug!(
            "fetching page {} for {:?} ({:?}, generation {})",
            request.params.page,
            request.params.q,
            request.kind,
            request.generation
        );

        let outcome = self.source.fetch(&request.params).await;
        let notify = match &outcome {
            Err(e) if !e.is_handled_globally() => {
                Some(format!("{MSG_FETCH_FAILED}: {}", e.user_message()))
            }
            _ => None,
        };

        let resolution = self.lock().resolve(request.generation, outcome);
        if resolution == Resolution::Failed {
            if let (Some(bus), Some(message)) = (&self.bus, notify) {
                bus.error(message);
            }
        }
        Some(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{ToastLevel, UiEventKind};
    use crate::model::PageMeta;
    use std::collections::HashMap;
    use std::time::Duration;

    /// In-memory source: `last_page` pages of two items per term, with an
    /// optional per-term latency. Records every query it serves.
    #[derive(Clone, Default)]
    struct FakeSource {
        last_page: u32,
        latency: HashMap<String, Duration>,
        fail: Arc<Mutex<bool>>,
        calls: Arc<Mutex<Vec<ListParams>>>,
    }

    impl FakeSource {
        fn new(last_page: u32) -> Self {
            Self {
                last_page,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<ListParams> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource<String> for FakeSource {
        async fn fetch(&self, params: &ListParams) -> Result<Paginated<String>, ApiError> {
            self.calls.lock().unwrap().push(params.clone());
            if let Some(delay) = self.latency.get(&params.q) {
                tokio::time::sleep(*delay).await;
            }
            if *self.fail.lock().unwrap() {
                return Err(ApiError::Transport("connection reset".to_string()));
            }
            Ok(Paginated {
                data: (0..2)
                    .map(|i| format!("{}-{}-{i}", params.q, params.page))
                    .collect(),
                meta: PageMeta {
                    current_page: params.page,
                    last_page: self.last_page,
                    per_page: Some(2),
                    total: None,
                },
            })
        }
    }

    #[tokio::test]
    async fn test_scroll_walks_pages_within_bounds() {
        let source = FakeSource::new(5);
        let list = InfiniteList::new(source.clone(), PagedFetchController::<String>::new());

        assert_eq!(list.open("").await, Some(Resolution::Applied));
        for _ in 0..2 {
            list.scroll(ScrollEdge::Bottom).await;
        }
        assert_eq!(list.cursor().current_page, 3);

        assert_eq!(list.scroll(ScrollEdge::Bottom).await, Some(Resolution::Applied));
        assert_eq!(list.cursor().current_page, 4);
        assert_eq!(list.items(), vec!["-4-0".to_string(), "-4-1".to_string()]);

        list.scroll(ScrollEdge::Bottom).await;
        let served = source.calls().len();
        assert_eq!(list.scroll(ScrollEdge::Bottom).await, None);
        assert_eq!(source.calls().len(), served);
        assert_eq!(list.cursor().current_page, 5);

        assert_eq!(list.scroll(ScrollEdge::Top).await, Some(Resolution::Applied));
        assert_eq!(list.cursor().current_page, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_for_old_term_is_discarded() {
        let mut source = FakeSource::new(1);
        source
            .latency
            .insert("x".to_string(), Duration::from_millis(300));
        let list = InfiniteList::new(source.clone(), PagedFetchController::<String>::new());
        list.open("").await;

        let (slow, fast) = tokio::join!(list.set_term("x"), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            list.set_term("y").await
        });

        assert_eq!(fast, Some(Resolution::Applied));
        assert_eq!(slow, Some(Resolution::Stale));
        assert_eq!(list.items(), vec!["y-1-0".to_string(), "y-1-1".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_last_good_page_and_toasts() {
        let source = FakeSource::new(3);
        let bus = Arc::new(EventBus::new());
        let mut events = bus.subscribe();
        let list = InfiniteList::new(source.clone(), PagedFetchController::<String>::new())
            .with_bus(bus.clone());

        list.open("ana").await;
        let shown = list.items();
        *source.fail.lock().unwrap() = true;

        assert_eq!(list.scroll(ScrollEdge::Bottom).await, Some(Resolution::Failed));
        assert_eq!(list.items(), shown);
        assert_eq!(list.cursor().current_page, 1);
        assert_eq!(list.state(), CursorState::Error);

        match events.recv().await.unwrap().kind {
            UiEventKind::Toast(toast) => {
                assert_eq!(toast.level, ToastLevel::Error);
                assert!(toast.message.starts_with(MSG_FETCH_FAILED));
            }
            other => panic!("expected an error toast, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_term_change_leaves_previous_results_visible() {
        let source = FakeSource::new(3);
        let list = InfiniteList::new(source.clone(), PagedFetchController::<String>::new());

        list.open("ana").await;
        list.scroll(ScrollEdge::Bottom).await;
        let shown = list.items();
        *source.fail.lock().unwrap() = true;

        assert_eq!(list.set_term("bruno").await, Some(Resolution::Failed));
        assert_eq!(list.items(), shown);
        assert_eq!(list.cursor().current_page, 2);

        *source.fail.lock().unwrap() = false;
        assert_eq!(list.refresh().await, Some(Resolution::Applied));
        assert_eq!(list.items(), vec!["bruno-1-0".to_string(), "bruno-1-1".to_string()]);
        assert_eq!(list.cursor().current_page, 1);
    }

    #[tokio::test]
    async fn test_close_clears_and_reopen_fetches_again() {
        let source = FakeSource::new(2);
        let list = InfiniteList::new(source.clone(), PagedFetchController::<String>::new());

        list.open("bia").await;
        assert_eq!(list.open("bia").await, None);
        list.close();
        assert!(list.items().is_empty());
        assert!(!list.is_enabled());

        assert_eq!(list.open("bia").await, Some(Resolution::Applied));
        assert_eq!(source.calls().len(), 2);
    }
}
