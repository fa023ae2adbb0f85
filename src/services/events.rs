//! Fan-out hub for monitor events. Keeps a bounded replay buffer for the
//! polling endpoint and a broadcast channel for SSE subscribers, with
//! per-address and global connection caps.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::error::AppError;
use crate::models::MonitorEvent;

const EVENT_BUFFER_CAPACITY: usize = 1000;
const BROADCAST_CAPACITY: usize = 256;
const MAX_TOTAL_CONNECTIONS: usize = 1000;
const MAX_CONNECTIONS_PER_ADDRESS: usize = 5;

pub struct EventHub {
    tx: broadcast::Sender<MonitorEvent>,
    buffer: Mutex<VecDeque<MonitorEvent>>,
    per_address: Mutex<HashMap<String, usize>>,
    total_connections: AtomicUsize,
}

impl Default for EventHub {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            buffer: Mutex::new(VecDeque::with_capacity(EVENT_BUFFER_CAPACITY)),
            per_address: Mutex::new(HashMap::new()),
            total_connections: AtomicUsize::new(0),
        }
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event in the replay buffer and push it to live subscribers.
    pub fn publish(&self, event: MonitorEvent) {
        {
            let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
            if buffer.len() == EVENT_BUFFER_CAPACITY {
                buffer.pop_front();
            }
            buffer.push_back(event.clone());
        }
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }

    /// Most recent buffered events, newest last, optionally filtered by
    /// agent id.
    pub fn recent(&self, agent_id: Option<&str>, limit: usize) -> Vec<MonitorEvent> {
        let buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        let matching: Vec<&MonitorEvent> = buffer
            .iter()
            .filter(|e| match agent_id {
                Some(id) => e.agent_id == id,
                None => true,
            })
            .collect();
        matching
            .into_iter()
            .rev()
            .take(limit)
            .rev()
            .cloned()
            .collect()
    }

    /// Open a live subscription for one wallet address, enforcing the
    /// connection caps. The returned guard releases its slot on drop.
    pub fn subscribe(self: &Arc<Self>, address: &str) -> Result<SseSubscription, AppError> {
        let key = address.to_lowercase();
        {
            // Both caps are checked and bumped under the one lock so
            // concurrent subscribers cannot overshoot either limit.
            let mut per_address = self.per_address.lock().unwrap_or_else(|e| e.into_inner());
            if self.total_connections.load(Ordering::SeqCst) >= MAX_TOTAL_CONNECTIONS {
                return Err(AppError::Unavailable(
                    "event stream at capacity, try again later".to_string(),
                ));
            }
            let count = per_address.entry(key.clone()).or_insert(0);
            if *count >= MAX_CONNECTIONS_PER_ADDRESS {
                return Err(AppError::RateLimited(format!(
                    "too many event streams open for {address}"
                )));
            }
            *count += 1;
            self.total_connections.fetch_add(1, Ordering::SeqCst);
        }

        Ok(SseSubscription {
            receiver: self.tx.subscribe(),
            hub: Arc::clone(self),
            address: key,
        })
    }

    fn release(&self, address: &str) {
        let mut per_address = self.per_address.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = per_address.get_mut(address) {
            *count -= 1;
            if *count == 0 {
                per_address.remove(address);
            }
        }
        self.total_connections.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Live event stream handle. Dropping it frees the connection slot.
pub struct SseSubscription {
    pub receiver: broadcast::Receiver<MonitorEvent>,
    hub: Arc<EventHub>,
    address: String,
}

impl SseSubscription {
    /// Lowercased wallet address this subscription watches.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Drop for SseSubscription {
    fn drop(&mut self) {
        self.hub.release(&self.address);
    }
}
