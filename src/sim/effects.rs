//! Per-session scheduled effects
//!
//! Delayed reverts (stun wearing off, screen un-dimming) are entries with a
//! tick countdown owned by the session, so nothing can fire after the
//! session is gone.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Player input ignored
    Stun,
    /// Presentation dims the play field
    Dim,
    /// Presentation flashes
    Flash,
    /// Steering and direction inputs mirrored
    ReverseControls,
    /// Opponent power doubled
    Surge,
    /// Sideways push on free-flying objects
    Wind,
}

impl EffectKind {
    /// Effects that only change presentation
    pub fn is_cosmetic(&self) -> bool {
        matches!(self, EffectKind::Dim | EffectKind::Flash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEffect {
    pub kind: EffectKind,
    pub remaining_ticks: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduledEffects {
    entries: Vec<ScheduledEffect>,
}

impl ScheduledEffects {
    /// Start an effect, or extend it if the new duration is longer
    pub fn schedule(&mut self, kind: EffectKind, ticks: u32) {
        if ticks == 0 {
            return;
        }
        match self.entries.iter_mut().find(|e| e.kind == kind) {
            Some(existing) => existing.remaining_ticks = existing.remaining_ticks.max(ticks),
            None => self.entries.push(ScheduledEffect {
                kind,
                remaining_ticks: ticks,
            }),
        }
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    pub fn remaining(&self, kind: EffectKind) -> u32 {
        self.entries
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.remaining_ticks)
            .unwrap_or(0)
    }

    /// Count every effect down by one tick; returns the ones that ended
    pub fn tick(&mut self) -> Vec<EffectKind> {
        let mut expired = Vec::new();
        self.entries.retain_mut(|e| {
            e.remaining_ticks = e.remaining_ticks.saturating_sub(1);
            if e.remaining_ticks == 0 {
                expired.push(e.kind);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn active(&self) -> Vec<EffectKind> {
        self.entries.iter().map(|e| e.kind).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
