// Presence Node: RTC-Retained Presence Flag
//
// RTC slow memory keeps its contents through deep sleep and is reloaded from
// the firmware image on power-up, so the flag reads `false` after a cold boot.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::state::StateStore;

#[link_section = ".rtc.data"]
static LAST_PRESENCE: AtomicBool = AtomicBool::new(false);

/// Handle to the retained "last reported presence" flag.
pub struct RtcStore {
    _private: (),
}

impl RtcStore {
    /// `cold_boot` forces the documented default for any wake that did not
    /// come from the deep-sleep timer.
    pub fn new(cold_boot: bool) -> Self {
        if cold_boot {
            LAST_PRESENCE.store(false, Ordering::SeqCst);
        }
        log::info!(
            "Retained state: last reported presence = {}",
            LAST_PRESENCE.load(Ordering::SeqCst)
        );
        Self { _private: () }
    }
}

impl StateStore for RtcStore {
    fn load(&self) -> bool {
        LAST_PRESENCE.load(Ordering::SeqCst)
    }

    fn store(&mut self, present: bool) {
        LAST_PRESENCE.store(present, Ordering::SeqCst);
    }
}
