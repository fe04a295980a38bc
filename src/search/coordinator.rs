//! Search coordination: debounced term, settle callback, combobox gating.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::debounce::Debouncer;
use crate::bus::event_types::{MSG_SEARCHING, MSG_SEARCH_DONE};
use crate::bus::{EventBus, ToastLevel};

/// Invoked with each newly settled term.
pub type SearchCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub raw_term: String,
    pub debounced_term: String,
    pub is_combobox_open: bool,
}

pub struct SearchOptions {
    pub delay: Duration,
    pub callback: Option<SearchCallback>,
    /// Wrap each settle in "Buscando..." / "Busca realizada com sucesso".
    pub notify: Option<Arc<EventBus>>,
}

impl SearchOptions {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            callback: None,
            notify: None,
        }
    }

    pub fn on_settle(mut self, callback: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn with_notifications(mut self, bus: Arc<EventBus>) -> Self {
        self.notify = Some(bus);
        self
    }
}

struct Inner {
    state: SearchState,
    /// Bumped on close; settles tagged with an older epoch are dropped.
    epoch: u64,
}

type Tagged = (u64, String);

pub struct SearchCoordinator {
    inner: Arc<Mutex<Inner>>,
    debouncer: Debouncer<Tagged>,
    combobox_tx: Arc<watch::Sender<Option<String>>>,
    settle_task: JoinHandle<()>,
}

impl SearchCoordinator {
    /// Must be called from within a tokio runtime.
    pub fn spawn(options: SearchOptions) -> Self {
        let inner = Arc::new(Mutex::new(Inner {
            state: SearchState::default(),
            epoch: 0,
        }));
        let (debouncer, settled) = Debouncer::spawn(options.delay);
        let (combobox_tx, _) = watch::channel(None);
        let combobox_tx = Arc::new(combobox_tx);

        let settle_task = tokio::spawn(settle_loop(
            settled,
            inner.clone(),
            combobox_tx.clone(),
            options.callback,
            options.notify,
        ));

        Self {
            inner,
            debouncer,
            combobox_tx,
            settle_task,
        }
    }

    /// Record a keystroke.
    pub fn set_term(&self, term: impl Into<String>) {
        let term = term.into();
        let epoch = {
            let mut guard = self.inner.lock().expect("search state poisoned");
            guard.state.raw_term = term.clone();
            guard.epoch
        };
        self.debouncer.update((epoch, term));
    }

    pub fn open(&self) {
        let debounced = {
            let mut guard = self.inner.lock().expect("search state poisoned");
            guard.state.is_combobox_open = true;
            guard.state.debounced_term.clone()
        };
        self.combobox_tx.send_replace(Some(debounced));
    }

    /// Close the owning dialog: reset the state and make any pending settle
    /// a no-op.
    pub fn close(&self) {
        {
            let mut guard = self.inner.lock().expect("search state poisoned");
            guard.epoch += 1;
            guard.state = SearchState::default();
        }
        self.debouncer.reset();
        self.combobox_tx.send_replace(None);
    }

    pub fn state(&self) -> SearchState {
        self.inner.lock().expect("search state poisoned").state.clone()
    }

    /// The debounced term, but only while the combobox is open.
    pub fn combobox_term(&self) -> Option<String> {
        self.combobox_tx.borrow().clone()
    }

    /// Follow the combobox term. `None` means closed.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.combobox_tx.subscribe()
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        self.settle_task.abort();
    }
}

async fn settle_loop(
    mut settled: mpsc::UnboundedReceiver<Tagged>,
    inner: Arc<Mutex<Inner>>,
    combobox_tx: Arc<watch::Sender<Option<String>>>,
    callback: Option<SearchCallback>,
    notify: Option<Arc<EventBus>>,
) {
    while let Some((epoch, term)) = settled.recv().await {
        let (changed, open) = {
            let mut guard = inner.lock().expect("search state poisoned");
            if guard.epoch != epoch {
                tracing::debug!("dropping search settle from a closed context");
                continue;
            }
            let changed = guard.state.debounced_term != term;
            guard.state.debounced_term = term.clone();
            (changed, guard.state.is_combobox_open)
        };

        if !changed {
            continue;
        }
        tracing::debug!("search settled on {term:?}");

        if open {
            combobox_tx.send_replace(Some(term.clone()));
        }

        if let Some(callback) = &callback {
            let toast_id = notify
                .as_ref()
                .map(|bus| bus.toast(ToastLevel::Loading, MSG_SEARCHING));
            callback(term);
            if let (Some(bus), Some(id)) = (&notify, toast_id) {
                bus.toast_with_id(&id, ToastLevel::Success, MSG_SEARCH_DONE);
            }
        }
    }
}
