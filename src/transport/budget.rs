//! Connection budget: a global ceiling plus a per-host ceiling on concurrent
//! connections, shared by all tasks of a run.

use super::TransportError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub struct ConnectionBudget {
    max: usize,
    per_host_max: usize,
    global: Arc<Semaphore>,
    per_host: Mutex<HashMap<String, Arc<Semaphore>>>,
}

/// Held for the lifetime of one request. Dropping it returns both slots.
#[derive(Debug)]
pub struct BudgetPermit {
    _host: OwnedSemaphorePermit,
    _global: OwnedSemaphorePermit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSnapshot {
    pub max: usize,
    pub available: usize,
    pub in_use: usize,
}

impl ConnectionBudget {
    pub fn new(max: usize, per_host_max: usize) -> Self {
        let max = max.max(1);
        Self {
            max,
            per_host_max: per_host_max.max(1),
            global: Arc::new(Semaphore::new(max)),
            per_host: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for a slot on `host` and a global slot, in that order, so a task
    /// queued on a saturated host does not pin a global slot.
    pub async fn acquire(&self, host: &str) -> Result<BudgetPermit, TransportError> {
        let host_sem = self.host_semaphore(host)?;
        let host_permit = host_sem
            .acquire_owned()
            .await
            .map_err(|_| TransportError::Budget(format!("per-host budget for {} closed", host)))?;
        let global_permit = self
            .global
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| TransportError::Budget("global connection budget closed".to_string()))?;
        Ok(BudgetPermit {
            _host: host_permit,
            _global: global_permit,
        })
    }

    fn host_semaphore(&self, host: &str) -> Result<Arc<Semaphore>, TransportError> {
        let mut map = self.per_host.lock().map_err(|e| {
            TransportError::Budget(format!(
                "failed to acquire per-host budget lock for {}: {}",
                host, e
            ))
        })?;
        Ok(map
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_max)))
            .clone())
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        let available = self.global.available_permits();
        BudgetSnapshot {
            max: self.max,
            available,
            in_use: self.max.saturating_sub(available),
        }
    }

    pub fn per_host_max(&self) -> usize {
        self.per_host_max
    }
}
