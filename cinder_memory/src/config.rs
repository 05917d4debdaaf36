//! Heap tuning parameters.

use crate::error::Error;
use crate::error::Result;

/// Configuration for a [`Heap`][`crate::heap::Heap`].
///
/// ```
/// use cinder_memory::config::HeapConfig;
/// use cinder_memory::heap::Heap;
///
/// let config = HeapConfig{
///     high_water_mark: 64,
///     ..HeapConfig::default()
/// };
/// let heap = Heap::with_config(config).unwrap();
/// assert!(heap.collection_enabled());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapConfig
{
    /// Number of instance headers added each time the pool grows.
    ///
    /// Default: 256
    pub pool_increment: usize,

    /// Number of descriptors the registry reserves each time it grows.
    ///
    /// Default: 32
    pub registry_increment: usize,

    /// Live instance count at which an allocation
    /// first triggers an automatic collection.
    ///
    /// Default: 10 000
    pub high_water_mark: usize,

    /// Minimum free list length after a collection
    /// for the allocator to start recycling headers.
    ///
    /// Below this, freed headers stay on the list
    /// and fresh slots are issued instead,
    /// so a handful of scratch allocations does not churn the list.
    ///
    /// Default: 64
    pub reuse_threshold: usize,

    /// Maximum number of nested protection frames.
    ///
    /// Pushes beyond this are clamped.
    ///
    /// Default: 1024
    pub max_frame_depth: usize,

    /// Whether allocations may trigger collections.
    ///
    /// Explicit calls to [`collect`] run regardless.
    ///
    /// [`collect`]: `crate::heap::Heap::collect`
    ///
    /// Default: true
    pub collection_enabled: bool,
}

impl HeapConfig
{
    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()>
    {
        if self.pool_increment == 0 {
            return Err(Error::Config("pool_increment must be positive"));
        }
        if self.registry_increment == 0 {
            return Err(Error::Config("registry_increment must be positive"));
        }
        if self.high_water_mark == 0 {
            return Err(Error::Config("high_water_mark must be positive"));
        }
        if self.max_frame_depth == 0 {
            return Err(Error::Config("max_frame_depth must be positive"));
        }
        Ok(())
    }
}

impl Default for HeapConfig
{
    fn default() -> Self
    {
        Self{
            pool_increment: 256,
            registry_increment: 32,
            high_water_mark: 10_000,
            reuse_threshold: 64,
            max_frame_depth: 1024,
            collection_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn default_is_valid()
    {
        assert_eq!(HeapConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_increment_is_rejected()
    {
        let config = HeapConfig{pool_increment: 0, ..HeapConfig::default()};
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn zero_frame_depth_is_rejected()
    {
        let config = HeapConfig{max_frame_depth: 0, ..HeapConfig::default()};
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
