//! Exclusive allocation of a fixed number of compute devices among threads.
//!
//! Callers block in [`DevicePool::allocate`] until a device is free and
//! receive a [`DeviceGuard`] that returns the device to the pool when
//! dropped.

use std::sync::{ Condvar, Mutex, MutexGuard };
use tracing::debug;
use crate::tb_assert;

/// A pool of `num_devices` interchangeable devices, identified by
/// `0..num_devices`.
#[derive(Debug)]
pub struct DevicePool {
    busy: Mutex<Vec<bool>>,
    freed: Condvar,
}

impl DevicePool {
    /// Create a new pool with all devices free.
    pub fn new(num_devices: usize) -> Self {
        Self { busy: Mutex::new(vec![false; num_devices]), freed: Condvar::new() }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<bool>> {
        // a panic while holding the lock cannot leave the flags inconsistent
        self.busy.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the total number of devices.
    pub fn num_devices(&self) -> usize { self.lock().len() }

    /// Return the number of devices not currently allocated.
    pub fn num_free(&self) -> usize {
        self.lock().iter().filter(|b| !**b).count()
    }

    fn claim(busy: &mut [bool]) -> Option<usize> {
        let device = busy.iter().position(|b| !*b)?;
        busy[device] = true;
        Some(device)
    }

    /// Allocate a device, blocking until one is free.
    ///
    /// *Panics* if the pool has no devices.
    pub fn allocate(&self) -> DeviceGuard<'_> {
        let mut busy = self.lock();
        tb_assert!(
            !busy.is_empty(),
            "DevicePool::allocate()",
            "the pool has no devices.",
            "Create the pool with at least one device.",
        );
        loop {
            if let Some(device) = Self::claim(&mut busy) {
                debug!("allocated device {device}");
                return DeviceGuard { pool: self, device };
            }
            busy = self.freed.wait(busy)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Allocate a device if one is free, without blocking.
    pub fn try_allocate(&self) -> Option<DeviceGuard<'_>> {
        let mut busy = self.lock();
        Self::claim(&mut busy).map(|device| DeviceGuard { pool: self, device })
    }

    fn free(&self, device: usize) {
        self.lock()[device] = false;
        debug!("freed device {device}");
        self.freed.notify_one();
    }
}

/// Exclusive use of one device of a [`DevicePool`], released on drop.
#[derive(Debug)]
pub struct DeviceGuard<'a> {
    pool: &'a DevicePool,
    device: usize,
}

impl<'a> DeviceGuard<'a> {
    /// Return the identifier of the allocated device.
    pub fn device(&self) -> usize { self.device }
}

impl<'a> Drop for DeviceGuard<'a> {
    fn drop(&mut self) { self.pool.free(self.device); }
}
