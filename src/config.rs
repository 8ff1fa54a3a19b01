//! Construction-time configuration for the hash engine.

use crate::error::{CollectionError, Result};

pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;
pub const DEFAULT_CAPACITY: usize = 8;
pub const MAX_CAPACITY: usize = 1 << 30;

/// Sizing policy for [`HashMap`](crate::HashMap) and the containers built on it.
///
/// A lower `load_factor` spends memory on more buckets to keep chains short.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HashConfig {
    pub load_factor: f64,
    pub initial_capacity: usize,
    pub max_capacity: usize,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            load_factor: DEFAULT_LOAD_FACTOR,
            initial_capacity: DEFAULT_CAPACITY,
            max_capacity: MAX_CAPACITY,
        }
    }
}

impl HashConfig {
    pub fn with_load_factor(load_factor: f64) -> Self {
        Self {
            load_factor,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_load_factor(self.load_factor)?;
        if !self.initial_capacity.is_power_of_two() || !self.max_capacity.is_power_of_two() {
            return Err(CollectionError::InvalidArgument(
                "capacities must be powers of two",
            ));
        }
        if self.initial_capacity > self.max_capacity {
            return Err(CollectionError::InvalidArgument(
                "initial capacity exceeds maximum capacity",
            ));
        }
        Ok(())
    }

    /// Largest entry count a table of `capacity` buckets holds before doubling.
    pub(crate) fn threshold(&self, capacity: usize) -> f64 {
        capacity as f64 * self.load_factor
    }

    /// Smallest power of two, at least `initial_capacity`, whose threshold
    /// admits `len` entries without growing.
    pub(crate) fn capacity_for(&self, len: usize) -> usize {
        let mut cap = self.initial_capacity;
        while (len as f64) > self.threshold(cap) && cap < self.max_capacity {
            cap <<= 1;
        }
        cap
    }
}

/// Load factors live on the open interval (0, 1). NaN is rejected too.
pub(crate) fn check_load_factor(load_factor: f64) -> Result<f64> {
    if load_factor > 0.0 && load_factor < 1.0 {
        Ok(load_factor)
    } else {
        Err(CollectionError::InvalidArgument(
            "load factor must lie strictly between 0 and 1",
        ))
    }
}
