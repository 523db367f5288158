// Presence Node: Sleep Scheduler
//
// Presence is the time-sensitive state (the person may leave soon), absence
// is stable and can be polled less often.

use std::time::Duration;

use crate::config::SleepConfig;
use crate::events::PresenceVerdict;

/// Sleep-until-timer primitive. The device resumes by re-running the firmware
/// from its entry point, so this never returns.
pub trait WakeTimer {
    fn sleep_for(&mut self, duration: Duration) -> !;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepScheduler {
    person: Duration,
    no_person: Duration,
}

impl SleepScheduler {
    pub fn new(config: &SleepConfig) -> Self {
        Self {
            person: config.person,
            no_person: config.no_person,
        }
    }

    pub fn duration_for(&self, verdict: PresenceVerdict) -> Duration {
        match verdict {
            PresenceVerdict::Present => self.person,
            PresenceVerdict::Absent => self.no_person,
        }
    }

    pub fn sleep<T: WakeTimer + ?Sized>(&self, verdict: PresenceVerdict, timer: &mut T) -> ! {
        let duration = self.duration_for(verdict);
        match verdict {
            PresenceVerdict::Present => log::info!("Person detected: entering short deep sleep."),
            PresenceVerdict::Absent => log::info!("No person detected: entering longer deep sleep."),
        }
        log::info!("Deep sleeping for {} ms...", duration.as_millis());
        timer.sleep_for(duration)
    }
}
