// Track: one of the 16 per-pattern channels, bound to a slot in a kit and
// a row of trigs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::id::{KitId, PatternId, PresetId, TrackId};
use crate::entity::kit::Kit;
use crate::entity::{MAX_NAME_LEN, now};
use crate::validation::ValidationError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub pattern: PatternId,
    pub kit: KitId,
    /// Slot index (0 - 15), unique within both the kit and the pattern
    pub slot: u8,
    pub name: String,
    /// Track volume (0.0 - 1.0)
    pub volume: f32,
    /// Track pan (-1.0 left, 0.0 center, 1.0 right)
    pub pan: f32,
    pub muted: bool,
    pub soloed: bool,
    /// Assigned sound source; nullified when the preset is deleted
    pub preset: Option<PresetId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Track {
    pub fn new(pattern: PatternId, kit: KitId, slot: u8) -> Self {
        let stamp = now();
        Self {
            id: TrackId::new(),
            pattern,
            kit,
            slot,
            // Display names are 1-based even though slots are 0-based
            name: format!("Track {}", slot + 1),
            volume: 0.8,
            pan: 0.0,
            muted: false,
            soloed: false,
            preset: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty("Track", "name"));
        }
        if trimmed.len() > MAX_NAME_LEN {
            return Err(ValidationError::too_long(
                "Track",
                "name",
                trimmed.len(),
                MAX_NAME_LEN,
            ));
        }
        self.name = name;
        self.touch();
        Ok(())
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(ValidationError::out_of_range(
                "Track", "volume", volume, 0.0, 1.0,
            ));
        }
        self.volume = volume;
        self.touch();
        Ok(())
    }

    pub fn set_pan(&mut self, pan: f32) -> Result<(), ValidationError> {
        if !(-1.0..=1.0).contains(&pan) {
            return Err(ValidationError::out_of_range(
                "Track", "pan", pan, -1.0, 1.0,
            ));
        }
        self.pan = pan;
        self.touch();
        Ok(())
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.touch();
    }

    pub fn set_soloed(&mut self, soloed: bool) {
        self.soloed = soloed;
        self.touch();
    }

    pub fn slot_in_range(&self) -> bool {
        (self.slot as usize) < Kit::TRACK_SLOTS
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}
