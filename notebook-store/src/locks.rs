use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Per-notebook exclusive lock registry. §5: writes within one notebook serialize on the
/// notebook lock; reads never block writes. One `Mutex<()>` per notebook id, created
/// lazily; the registry mutex itself is only held for the instant it takes to look up or
/// insert an entry, never across the actual write.
#[derive(Default, Clone)]
pub struct NotebookLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl NotebookLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, notebook_id: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(notebook_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
