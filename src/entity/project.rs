// Project: the root of the ownership tree
// Owns patterns, one preset pool and one mixer settings record (all cascade).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::id::{MixerSettingsId, ProjectId};
use crate::entity::{MAX_NAME_LEN, TEMPO_MAX, TEMPO_MIN, now};
use crate::validation::ValidationError;

/// Maximum number of patterns one project may own
pub const MAX_PATTERNS_PER_PROJECT: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Project-level tempo in BPM, inherited by new patterns
    pub tempo: f64,
    /// Master output level (0.0 - 1.0)
    pub master_volume: f32,
    /// Master swing amount (0.0 - 1.0), applied when a pattern has none
    pub master_swing: f32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let stamp = now();
        Self {
            id: ProjectId::new(),
            name: name.into(),
            tempo: 120.0,
            master_volume: 0.8,
            master_swing: 0.0,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty("Project", "name"));
        }
        if trimmed.len() > MAX_NAME_LEN {
            return Err(ValidationError::too_long(
                "Project",
                "name",
                trimmed.len(),
                MAX_NAME_LEN,
            ));
        }
        self.name = name;
        self.touch();
        Ok(())
    }

    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), ValidationError> {
        if !(TEMPO_MIN..=TEMPO_MAX).contains(&bpm) {
            return Err(ValidationError::out_of_range(
                "Project", "tempo", bpm, TEMPO_MIN, TEMPO_MAX,
            ));
        }
        self.tempo = bpm;
        self.touch();
        Ok(())
    }

    pub fn set_master_volume(&mut self, volume: f32) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(ValidationError::out_of_range(
                "Project",
                "master_volume",
                volume,
                0.0,
                1.0,
            ));
        }
        self.master_volume = volume;
        self.touch();
        Ok(())
    }

    pub fn set_master_swing(&mut self, swing: f32) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&swing) {
            return Err(ValidationError::out_of_range(
                "Project",
                "master_swing",
                swing,
                0.0,
                1.0,
            ));
        }
        self.master_swing = swing;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

/// Per-project mixer state, created with the project and cascade-deleted
/// with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixerSettings {
    pub id: MixerSettingsId,
    pub project: ProjectId,
    /// Master bus level (0.0 - 1.0)
    pub master_volume: f32,
    /// Cue/headphone bus level (0.0 - 1.0)
    pub cue_volume: f32,
    /// Per-slot channel levels, indexed by track slot
    pub levels: [f32; 16],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MixerSettings {
    pub fn new(project: ProjectId) -> Self {
        let stamp = now();
        Self {
            id: MixerSettingsId::new(),
            project,
            master_volume: 0.8,
            cue_volume: 0.8,
            levels: [0.8; 16],
            created_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn set_level(&mut self, slot: usize, level: f32) -> Result<(), ValidationError> {
        if slot >= self.levels.len() {
            return Err(ValidationError::out_of_range(
                "MixerSettings",
                "slot",
                slot,
                0,
                self.levels.len() - 1,
            ));
        }
        if !(0.0..=1.0).contains(&level) {
            return Err(ValidationError::out_of_range(
                "MixerSettings",
                "levels",
                level,
                0.0,
                1.0,
            ));
        }
        self.levels[slot] = level;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_defaults() {
        let project = Project::new("Demo");
        assert_eq!(project.name, "Demo");
        assert_eq!(project.tempo, 120.0);
        assert_eq!(project.master_volume, 0.8);
        assert_eq!(project.master_swing, 0.0);
        assert!(project.created_at <= project.updated_at);
    }

    #[test]
    fn test_set_tempo_rejects_out_of_range() {
        let mut project = Project::new("Demo");
        assert!(project.set_tempo(59.9).is_err());
        assert!(project.set_tempo(300.1).is_err());
        assert_eq!(project.tempo, 120.0);
        assert!(project.set_tempo(174.0).is_ok());
        assert_eq!(project.tempo, 174.0);
    }

    #[test]
    fn test_set_name_trims_before_measuring() {
        let mut project = Project::new("Demo");
        assert!(project.set_name("   ").is_err());
        assert!(project.set_name("  Live Set  ").is_ok());
    }

    #[test]
    fn test_setter_restamps_updated_at() {
        let mut project = Project::new("Demo");
        let before = project.updated_at;
        project.set_master_volume(0.5).unwrap();
        assert!(project.updated_at >= before);
        assert_eq!(project.master_volume, 0.5);
    }

    #[test]
    fn test_mixer_level_bounds() {
        let mut mixer = MixerSettings::new(ProjectId::new());
        assert!(mixer.set_level(3, 0.5).is_ok());
        assert!(mixer.set_level(3, 1.5).is_err());
        assert!(mixer.set_level(16, 0.5).is_err());
        assert_eq!(mixer.levels[3], 0.5);
    }
}
