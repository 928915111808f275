use serde::{Deserialize, Serialize};
use std::fmt;

/// Security identifier assigned to an instrument within one ingestion run.
///
/// Sids are only unique and stable inside a single run; a re-ingest may hand
/// the same symbol a different sid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sid(pub u32);

impl Sid {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out sids 1, 2, 3, ... in call order.
#[derive(Debug, Default)]
pub struct SidAllocator {
    last: u32,
}

impl SidAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_sid(&mut self) -> Sid {
        self.last += 1;
        Sid(self.last)
    }

    /// Number of sids handed out so far.
    pub fn issued(&self) -> u32 {
        self.last
    }
}
