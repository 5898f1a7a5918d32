//! Monotonic generation tokens for superseding in-flight work.
//!
//! A lookup is tagged with the generation current when it started. Work that
//! finishes after the counter has moved on is stale and must be dropped.

use anyhow::{Result, anyhow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: u64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate everything issued so far and hand out a fresh token.
    pub fn advance(&mut self) -> Generation {
        self.current = self.current.wrapping_add(1);
        Generation(self.current)
    }

    pub fn current(&self) -> Generation {
        Generation(self.current)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.current
    }

    pub fn ensure_current(&self, generation: Generation, stage: &'static str) -> Result<()> {
        if !self.is_current(generation) {
            return Err(anyhow!(
                "stale generation {} (current {}) at stage={stage}",
                generation.0,
                self.current
            ));
        }
        Ok(())
    }
}
