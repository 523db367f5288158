// Presence Node: Cycle Data Types

// ---------------------------------------------------------------------------
// Sample (one ultrasonic ranging result)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// Echo returned; distance in centimetres.
    Distance(f32),
    /// Echo never returned within the timeout window.
    Invalid,
}

impl Sample {
    pub fn distance_cm(&self) -> Option<f32> {
        match self {
            Self::Distance(cm) => Some(*cm),
            Self::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Distance(_))
    }
}

/// Samples collected during one active window, in acquisition order.
pub type SampleWindow = Vec<Sample>;

// ---------------------------------------------------------------------------
// Presence verdict
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceVerdict {
    Absent,
    Present,
}

impl PresenceVerdict {
    pub fn from_present(present: bool) -> Self {
        if present {
            Self::Present
        } else {
            Self::Absent
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }

    /// Integer encoding pushed to the remote sink (1 = present, 0 = absent).
    pub fn status(&self) -> u8 {
        match self {
            Self::Present => 1,
            Self::Absent => 0,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Present => "YES",
            Self::Absent => "NO",
        }
    }
}

impl From<PresenceVerdict> for bool {
    fn from(verdict: PresenceVerdict) -> Self {
        verdict.is_present()
    }
}

// ---------------------------------------------------------------------------
// Report record (what a state change pushes to the sink)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRecord {
    pub path: String,
    pub status: u8,
}

impl ReportRecord {
    pub fn new(path: &str, verdict: PresenceVerdict) -> Self {
        Self {
            path: path.to_owned(),
            status: verdict.status(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle phases
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Sampling,
    Classifying,
    Reporting,
    Sleeping,
}

impl Default for CyclePhase {
    fn default() -> Self {
        Self::Sampling
    }
}
