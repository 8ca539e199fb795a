//! Host/device memory budgets with priority-based eviction (spec §4.6).

use std::collections::HashMap;

use log::warn;

use crate::core::config::BudgetMode;
use crate::ids::ResourceId;

/// Eviction priority a resource carries; lower-priority resources are
/// evicted first when a budget is over threshold in `Lenient` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy)]
struct Usage {
    bytes: u64,
    priority: Priority,
    /// Monotonic recency stamp; higher means more recently touched.
    last_used: u64,
}

/// Errors a budget manager can raise (spec §7 `ResourceError`,
/// "budget exceeded in Strict mode").
#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    #[error("budget exceeded: requested {requested} bytes, {available} available (hard max {hard_max})")]
    Exceeded { requested: u64, available: u64, hard_max: u64 },
}

/// A single pool of byte budget tracked against a hard max and warning
/// threshold, with strict/lenient overflow handling (spec §4.6).
pub struct Budget {
    label: &'static str,
    hard_max_bytes: u64,
    warning_threshold_bytes: u64,
    mode: BudgetMode,
    used_bytes: u64,
    clock: u64,
    usages: HashMap<ResourceId, Usage>,
    warned: bool,
}

impl Budget {
    pub fn new(label: &'static str, hard_max_bytes: u64, warning_threshold_bytes: u64, mode: BudgetMode) -> Self {
        Self {
            label,
            hard_max_bytes,
            warning_threshold_bytes,
            mode,
            used_bytes: 0,
            clock: 0,
            usages: HashMap::new(),
            warned: false,
        }
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    pub fn hard_max_bytes(&self) -> u64 {
        self.hard_max_bytes
    }

    /// Reserve `bytes` for `resource`. In `Strict` mode this fails once
    /// the hard max would be exceeded; in `Lenient` mode it evicts
    /// lowest-priority, least-recently-used resources (returned to the
    /// caller so they can be queued for deferred destruction) until there
    /// is room, or fails if even evicting everything wouldn't make room.
    pub fn reserve(
        &mut self,
        resource: ResourceId,
        bytes: u64,
        priority: Priority,
    ) -> Result<Vec<ResourceId>, BudgetError> {
        self.clock += 1;
        let mut evicted = Vec::new();

        if self.used_bytes + bytes > self.hard_max_bytes {
            match self.mode {
                BudgetMode::Strict => {
                    return Err(BudgetError::Exceeded {
                        requested: bytes,
                        available: self.hard_max_bytes.saturating_sub(self.used_bytes),
                        hard_max: self.hard_max_bytes,
                    });
                }
                BudgetMode::Lenient => {
                    evicted = self.evict_until_fits(bytes)?;
                }
            }
        }

        self.usages.insert(resource, Usage { bytes, priority, last_used: self.clock });
        self.used_bytes += bytes;
        self.check_warning_threshold();
        Ok(evicted)
    }

    /// Release a previously reserved resource's bytes.
    pub fn release(&mut self, resource: ResourceId) {
        if let Some(usage) = self.usages.remove(&resource) {
            self.used_bytes = self.used_bytes.saturating_sub(usage.bytes);
        }
    }

    /// Touch a resource, refreshing its recency stamp (reduces its
    /// eviction risk under `Lenient` pressure).
    pub fn touch(&mut self, resource: ResourceId) {
        self.clock += 1;
        if let Some(usage) = self.usages.get_mut(&resource) {
            usage.last_used = self.clock;
        }
    }

    fn evict_until_fits(&mut self, requested: u64) -> Result<Vec<ResourceId>, BudgetError> {
        let mut evicted = Vec::new();
        while self.used_bytes + requested > self.hard_max_bytes {
            let Some((&victim, _)) = self
                .usages
                .iter()
                .min_by_key(|(_, usage)| (usage.priority, std::cmp::Reverse(usage.last_used)))
            else {
                return Err(BudgetError::Exceeded {
                    requested,
                    available: self.hard_max_bytes.saturating_sub(self.used_bytes),
                    hard_max: self.hard_max_bytes,
                });
            };
            self.release(victim);
            evicted.push(victim);
        }
        Ok(evicted)
    }

    fn check_warning_threshold(&mut self) {
        if self.used_bytes >= self.warning_threshold_bytes {
            if !self.warned {
                warn!(
                    "{} budget crossed warning threshold: {}/{} bytes",
                    self.label, self.used_bytes, self.hard_max_bytes
                );
                self.warned = true;
            }
        } else {
            self.warned = false;
        }
    }
}

/// Tracks host stack and heap byte budgets (spec §4.6, `HostBudgetManager`).
pub struct HostBudgetManager {
    pub stack: Budget,
    pub heap: Budget,
}

impl HostBudgetManager {
    pub fn new(stack_max: u64, heap_max: u64, mode: BudgetMode) -> Self {
        Self {
            stack: Budget::new("host_stack", stack_max, stack_max * 8 / 10, mode),
            heap: Budget::new("host_heap", heap_max, heap_max * 8 / 10, mode),
        }
    }
}

/// Tracks device-local, host-visible, and staging byte budgets (spec
/// §4.6, `DeviceBudgetManager`).
pub struct DeviceBudgetManager {
    pub device_local: Budget,
    pub host_visible: Budget,
    pub staging: Budget,
}

impl DeviceBudgetManager {
    pub fn new(device_local_max: u64, host_visible_max: u64, staging_max: u64, mode: BudgetMode) -> Self {
        Self {
            device_local: Budget::new("device_local", device_local_max, device_local_max * 8 / 10, mode),
            host_visible: Budget::new("host_visible", host_visible_max, host_visible_max * 8 / 10, mode),
            staging: Budget::new("staging", staging_max, staging_max * 8 / 10, mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::{HandleMap, TypedHandle};

    fn rid(slots: &mut HandleMap<()>) -> ResourceId {
        TypedHandle::new(slots.insert(()))
    }

    #[test]
    fn strict_mode_rejects_overflow() {
        let mut slots = HandleMap::new();
        let mut budget = Budget::new("test", 100, 80, BudgetMode::Strict);
        assert!(budget.reserve(rid(&mut slots), 50, Priority::Medium).is_ok());
        assert!(budget.reserve(rid(&mut slots), 60, Priority::Medium).is_err());
    }

    #[test]
    fn lenient_mode_evicts_lowest_priority_first() {
        let mut slots = HandleMap::new();
        let mut budget = Budget::new("test", 100, 80, BudgetMode::Lenient);
        let low = rid(&mut slots);
        let high = rid(&mut slots);
        budget.reserve(low, 60, Priority::Low).unwrap();
        budget.reserve(high, 40, Priority::High).unwrap();

        let incoming = rid(&mut slots);
        let evicted = budget.reserve(incoming, 50, Priority::Critical).unwrap();
        assert_eq!(evicted, vec![low]);
        assert_eq!(budget.used_bytes(), 40 + 50);
    }

    #[test]
    fn release_frees_reserved_bytes() {
        let mut slots = HandleMap::new();
        let mut budget = Budget::new("test", 100, 80, BudgetMode::Strict);
        let r = rid(&mut slots);
        budget.reserve(r, 50, Priority::Medium).unwrap();
        budget.release(r);
        assert_eq!(budget.used_bytes(), 0);
    }
}
