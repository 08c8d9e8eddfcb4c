use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

pub const IMPORT_PROGRESS: &str = "import-progress";

/// 匯入進度事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub message: String,
    pub success: bool,
    pub step: usize,
    pub total: usize,
}

impl ImportProgress {
    pub fn is_complete(&self) -> bool {
        self.success && self.total > 0 && self.step >= self.total
    }
}

pub type SubscriptionId = u64;

type Handler = Arc<dyn Fn(&ImportProgress) + Send + Sync>;

/// Publish/subscribe hub keyed by event name. Handlers run synchronously,
/// in the order they subscribed.
#[derive(Default)]
pub struct Dispatcher {
    handlers: RwLock<HashMap<String, Vec<(SubscriptionId, Handler)>>>,
    next_id: Mutex<SubscriptionId>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&ImportProgress) + Send + Sync + 'static,
    {
        let id = {
            let mut next = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
            *next += 1;
            *next
        };
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        handlers
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Removes a handler; returns false when it was not subscribed.
    pub fn off(&self, event: &str, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        match handlers.get_mut(event) {
            Some(list) => {
                let before = list.len();
                list.retain(|(handler_id, _)| *handler_id != id);
                list.len() != before
            }
            None => false,
        }
    }

    pub fn trigger(&self, event: &str, payload: &ImportProgress) {
        // 先複製 handler 清單，避免 handler 內再訂閱時死鎖
        let handlers: Vec<Handler> = {
            let map = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            map.get(event)
                .map(|list| list.iter().map(|(_, handler)| Arc::clone(handler)).collect())
                .unwrap_or_default()
        };

        for handler in handlers {
            handler(payload);
        }
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.handlers
            .read()
            .map(|map| map.get(event).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

/// Terminal counterpart of the progress popup: logs every `import-progress`
/// event and keeps the history for the final summary.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    events: Arc<Mutex<Vec<ImportProgress>>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, dispatcher: &Dispatcher) -> SubscriptionId {
        let events = Arc::clone(&self.events);
        dispatcher.on(IMPORT_PROGRESS, move |progress| {
            if progress.success {
                tracing::info!("📤 [{}/{}] {}", progress.step, progress.total, progress.message);
            } else {
                tracing::error!("❌ [{}/{}] {}", progress.step, progress.total, progress.message);
            }
            events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(progress.clone());
        })
    }

    pub fn events(&self) -> Vec<ImportProgress> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn failed(&self) -> bool {
        self.events().iter().any(|event| !event.success)
    }

    pub fn last(&self) -> Option<ImportProgress> {
        self.events().last().cloned()
    }
}
