// Kit: a fixed 16-slot collection of track/machine assignments plus shared
// master effect settings, reusable across patterns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::id::{FxSettingsId, KitId, PresetId};
use crate::entity::{MAX_NAME_LEN, now};
use crate::validation::ValidationError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kit {
    pub id: KitId,
    pub name: String,
    /// Master effect sends (0.0 - 1.0 each)
    pub delay_enabled: bool,
    pub delay_level: f32,
    pub reverb_enabled: bool,
    pub reverb_level: f32,
    pub compressor_enabled: bool,
    pub compressor_level: f32,
    /// Shared preset links (many-to-many, nullify on preset delete)
    pub presets: Vec<PresetId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Kit {
    /// Every kit fills exactly this many track slots
    pub const TRACK_SLOTS: usize = 16;

    pub fn new(name: impl Into<String>) -> Self {
        let stamp = now();
        Self {
            id: KitId::new(),
            name: name.into(),
            delay_enabled: false,
            delay_level: 0.3,
            reverb_enabled: false,
            reverb_level: 0.3,
            compressor_enabled: false,
            compressor_level: 0.5,
            presets: Vec::new(),
            created_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty("Kit", "name"));
        }
        if trimmed.len() > MAX_NAME_LEN {
            return Err(ValidationError::too_long(
                "Kit",
                "name",
                trimmed.len(),
                MAX_NAME_LEN,
            ));
        }
        self.name = name;
        self.touch();
        Ok(())
    }

    pub fn set_delay(&mut self, enabled: bool, level: f32) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&level) {
            return Err(ValidationError::out_of_range(
                "Kit",
                "delay_level",
                level,
                0.0,
                1.0,
            ));
        }
        self.delay_enabled = enabled;
        self.delay_level = level;
        self.touch();
        Ok(())
    }

    pub fn set_reverb(&mut self, enabled: bool, level: f32) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&level) {
            return Err(ValidationError::out_of_range(
                "Kit",
                "reverb_level",
                level,
                0.0,
                1.0,
            ));
        }
        self.reverb_enabled = enabled;
        self.reverb_level = level;
        self.touch();
        Ok(())
    }

    pub fn set_compressor(&mut self, enabled: bool, level: f32) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&level) {
            return Err(ValidationError::out_of_range(
                "Kit",
                "compressor_level",
                level,
                0.0,
                1.0,
            ));
        }
        self.compressor_enabled = enabled;
        self.compressor_level = level;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

/// Kit-owned effect parameter block, cascade-deleted with its kit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxSettings {
    pub id: FxSettingsId,
    pub kit: KitId,
    /// Delay time as a fraction of one beat (0.0 - 1.0)
    pub delay_time: f32,
    pub delay_feedback: f32,
    pub reverb_size: f32,
    pub reverb_damping: f32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FxSettings {
    pub fn new(kit: KitId) -> Self {
        let stamp = now();
        Self {
            id: FxSettingsId::new(),
            kit,
            delay_time: 0.5,
            delay_feedback: 0.4,
            reverb_size: 0.5,
            reverb_damping: 0.5,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}
