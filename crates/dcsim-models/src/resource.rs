//! Accounting of a single resource quantity.
//!
//! A [`Resource`] tracks the capacity of some quantity (MIPS of a core, RAM, bandwidth, storage) and the amount
//! of it currently allocated. All mutators report contention by returning `false` and leave the resource
//! unchanged in this case, so callers can check the feasibility of allocation before committing it.

use serde::Serialize;

/// Capacity and allocation state of a resource.
///
/// Invariant: `0 <= allocated <= capacity`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Resource {
    capacity: u64,
    allocated: u64,
}

impl Resource {
    /// Creates a resource with the specified capacity and nothing allocated.
    pub fn new(capacity: u64) -> Self {
        Self { capacity, allocated: 0 }
    }

    /// Returns the resource capacity.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns the currently allocated amount.
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    /// Returns the amount which can still be allocated.
    pub fn available(&self) -> u64 {
        self.capacity - self.allocated
    }

    /// Returns the allocated fraction of the capacity (zero for a resource without capacity).
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.;
        }
        self.allocated as f64 / self.capacity as f64
    }

    /// Checks that nothing can be allocated anymore.
    pub fn is_full(&self) -> bool {
        self.allocated == self.capacity
    }

    /// Checks that the specified amount can be allocated in addition to the current allocation.
    pub fn is_resource_amount_available(&self, amount: u64) -> bool {
        self.available() >= amount
    }

    /// Checks whether the allocation could be replaced by `new_total` without actually doing it.
    pub fn is_suitable(&self, new_total: u64) -> bool {
        new_total <= self.capacity
    }

    /// Allocates the specified amount.
    ///
    /// Succeeds only if `amount > 0` and at least `amount` is available.
    pub fn allocate(&mut self, amount: u64) -> bool {
        if amount == 0 || !self.is_resource_amount_available(amount) {
            return false;
        }
        self.allocated += amount;
        true
    }

    /// Releases the specified amount.
    ///
    /// Succeeds only if `amount > 0` and at least `amount` is allocated.
    pub fn deallocate(&mut self, amount: u64) -> bool {
        if amount == 0 || self.allocated < amount {
            return false;
        }
        self.allocated -= amount;
        true
    }

    /// Releases everything and returns the released amount.
    pub fn deallocate_all(&mut self) -> u64 {
        std::mem::take(&mut self.allocated)
    }

    /// Replaces the current allocation with `new_total`.
    ///
    /// The current allocation is released first. If `new_total` exceeds the capacity, the resource is left
    /// with zero allocation and `false` is returned. Setting zero always succeeds.
    pub fn set_allocated(&mut self, new_total: u64) -> bool {
        self.deallocate_all();
        if new_total == 0 {
            return true;
        }
        self.allocate(new_total)
    }

    /// Changes the resource capacity.
    ///
    /// Fails if the new capacity is smaller than the currently allocated amount.
    pub fn set_capacity(&mut self, capacity: u64) -> bool {
        if capacity < self.allocated {
            return false;
        }
        self.capacity = capacity;
        true
    }
}
