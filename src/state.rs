// Presence Node: Retained State
//
// The last reported presence value is the only thing that outlives a wake
// cycle. On the device it lives in RTC slow memory (see
// `drivers::rtc_state`); anything else implementing `StateStore` can stand
// in, e.g. NVS on chips without retention or `MemoryStore` in tests.

/// Holds "last reported presence" across sleep transitions.
/// Access is strictly sequential, with at most one store per cycle.
pub trait StateStore {
    fn load(&self) -> bool;
    fn store(&mut self, present: bool);
}

impl<S: StateStore + ?Sized> StateStore for &mut S {
    fn load(&self) -> bool {
        (**self).load()
    }

    fn store(&mut self, present: bool) {
        (**self).store(present)
    }
}

/// Volatile store. Starts from the cold-boot default (`false`).
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    value: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn with_value(value: bool) -> Self {
        Self { value, writes: 0 }
    }

    /// Number of `store` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> bool {
        self.value
    }

    fn store(&mut self, present: bool) {
        self.value = present;
        self.writes += 1;
    }
}
