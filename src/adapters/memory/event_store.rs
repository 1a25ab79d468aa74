use crate::domain::{PostId, events::DomainEvent};
use crate::ports::event_store::{EventStore as EventStoreTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// EventStoreのインメモリ実装
pub struct EventStore {
    streams: Mutex<HashMap<PostId, Vec<DomainEvent>>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStoreTrait for EventStore {
    async fn append(&self, post_id: PostId, events: Vec<DomainEvent>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut streams = self.streams.lock().map_err(|e| e.to_string())?;
        streams.entry(post_id).or_default().extend(events);
        Ok(())
    }

    async fn load(&self, post_id: PostId) -> Result<Vec<DomainEvent>> {
        let streams = self.streams.lock().map_err(|e| e.to_string())?;
        Ok(streams.get(&post_id).cloned().unwrap_or_default())
    }
}
