//! Worker combobox: a search coordinator feeding an infinite list of active
//! workers while the dropdown is open.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::controller::{InfiniteList, PageSource};
use super::cursor::{CursorState, PageCursor, PagedFetchController, Resolution, ScrollEdge};
use crate::api::{ApiClient, ApiError, ListParams};
use crate::bus::EventBus;
use crate::model::{Id, Paginated, Worker};
use crate::search::{SearchCoordinator, SearchOptions, SearchState};

pub const ACTIVE_FILTER: (&str, &str) = ("status", "active");

pub struct WorkersSource {
    api: Arc<ApiClient>,
}

impl WorkersSource {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource<Worker> for WorkersSource {
    async fn fetch(&self, params: &ListParams) -> Result<Paginated<Worker>, ApiError> {
        self.api.list_workers(params).await
    }
}

pub struct WorkerPicker<S: PageSource<Worker> + 'static = WorkersSource> {
    search: SearchCoordinator,
    list: Arc<InfiniteList<Worker, S>>,
    driver: JoinHandle<()>,
}

impl WorkerPicker<WorkersSource> {
    pub fn for_api(api: Arc<ApiClient>, bus: Arc<EventBus>, delay: Duration) -> Self {
        Self::spawn(WorkersSource::new(api), delay, Some(bus))
    }
}

impl<S: PageSource<Worker> + 'static> WorkerPicker<S> {
    /// Must be called from within a tokio runtime.
    pub fn spawn(source: S, delay: Duration, bus: Option<Arc<EventBus>>) -> Self {
        let (key, value) = ACTIVE_FILTER;
        let mut list = InfiniteList::new(
            source,
            PagedFetchController::new().with_filter(key, value),
        );
        if let Some(bus) = bus {
            list = list.with_bus(bus);
        }
        let list = Arc::new(list);

        let search = SearchCoordinator::spawn(SearchOptions::new(delay));
        let driver = tokio::spawn(drive(search.subscribe(), list.clone()));

        Self {
            search,
            list,
            driver,
        }
    }

    pub fn open(&self) {
        self.search.open();
    }

    /// Closing resets the search and drops whatever is still loading.
    pub fn close(&self) {
        self.list.close();
        self.search.close();
    }

    pub fn set_term(&self, term: impl Into<String>) {
        self.search.set_term(term);
    }

    pub async fn scroll(&self, edge: ScrollEdge) -> Option<Resolution> {
        self.list.scroll(edge).await
    }

    pub fn search_state(&self) -> SearchState {
        self.search.state()
    }

    pub fn items(&self) -> Vec<Worker> {
        self.list.items()
    }

    pub fn cursor(&self) -> PageCursor {
        self.list.cursor()
    }

    pub fn state(&self) -> CursorState {
        self.list.state()
    }

    pub fn select(&self, id: Id) -> Option<Worker> {
        self.list.items().into_iter().find(|worker| worker.id == id)
    }
}

impl<S: PageSource<Worker> + 'static> Drop for WorkerPicker<S> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

async fn drive<S: PageSource<Worker>>(
    mut terms: watch::Receiver<Option<String>>,
    list: Arc<InfiniteList<Worker, S>>,
) {
    while terms.changed().await.is_ok() {
        let term = terms.borrow_and_update().clone();
        match term {
            Some(term) => {
                list.open(term).await;
            }
            None => list.close(),
        }
    }
}
