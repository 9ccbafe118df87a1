//! Process-wide task registry with time-based eviction.

use crate::models::{TaskInfo, TaskResponse, TaskStatus};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Mapping from task id to [`TaskInfo`], shared across the process.
///
/// All mutations go through this type; readers get cloned snapshots, so
/// eviction can never invalidate a record a reader already holds. Updates to
/// a single entry are atomic with respect to concurrent `get`s.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: DashMap<String, TaskInfo>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a fresh task and return its record.
    pub fn create(&self) -> TaskInfo {
        let task_id = Uuid::new_v4().to_string();
        let info = TaskInfo::new(&task_id);
        self.tasks.insert(task_id.clone(), info.clone());
        info!(task_id, "Task registered");
        info
    }

    /// Snapshot of a task record, if present.
    pub fn get(&self, task_id: &str) -> Option<TaskInfo> {
        self.tasks.get(task_id).map(|entry| entry.value().clone())
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Liveness marker: refresh `updated_at` and keep the task in progress.
    ///
    /// This is the sole mechanism that keeps a long-running task from being
    /// evicted. A no-op for unknown (already evicted) tasks.
    pub fn heartbeat(&self, task_id: &str) {
        if let Some(mut entry) = self.tasks.get_mut(task_id) {
            entry.status = TaskStatus::InProgress;
            entry.updated_at = Utc::now();
        }
    }

    /// Atomically update status, optional response, and `updated_at`.
    ///
    /// Returns `false` when the task is unknown (evicted mid-flight); the
    /// update becomes a deliberate no-op in that case.
    pub fn update_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        response: Option<TaskResponse>,
    ) -> bool {
        match self.tasks.get_mut(task_id) {
            Some(mut entry) => {
                entry.status = status;
                if let Some(response) = response {
                    entry.response = Some(response);
                }
                entry.updated_at = Utc::now();
                true
            }
            None => {
                debug!(task_id, "Status update for evicted task ignored");
                false
            }
        }
    }

    /// Remove every task whose `updated_at` is older than `expiry`.
    ///
    /// Returns the number of evicted tasks.
    pub fn evict_expired(&self, expiry: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(expiry).unwrap_or_else(|_| chrono::Duration::zero());
        let before = self.tasks.len();
        self.tasks.retain(|_, info| info.updated_at >= cutoff);
        let evicted = before - self.tasks.len();
        if evicted > 0 {
            info!(evicted, "Evicted expired tasks");
        }
        evicted
    }

    /// Start the background eviction loop.
    ///
    /// The loop holds only a weak reference, so it winds down when the last
    /// strong reference to the registry is dropped.
    pub fn spawn_cleanup(
        self: &Arc<Self>,
        interval: Duration,
        expiry: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so a fresh registry
            // isn't swept before any task had a chance to update.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(registry) => {
                        registry.evict_expired(expiry);
                    }
                    None => break,
                }
            }
        })
    }
}

/// Heartbeat adapter wiring the workflow engine to the registry.
#[derive(Clone)]
pub struct RegistryHeartbeat {
    registry: Arc<TaskRegistry>,
    task_id: String,
}

impl RegistryHeartbeat {
    /// Create a heartbeat for one task.
    pub fn new(registry: Arc<TaskRegistry>, task_id: impl Into<String>) -> Self {
        Self {
            registry,
            task_id: task_id.into(),
        }
    }
}

impl agent::Heartbeat for RegistryHeartbeat {
    fn touch(&self) {
        self.registry.heartbeat(&self.task_id);
    }
}
