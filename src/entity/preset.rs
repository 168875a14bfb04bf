// Preset: a named, reusable machine configuration, collected per project
// in a preset pool and shareable across kits and tracks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::id::{MachineId, PresetId, PresetPoolId, ProjectId};
use crate::entity::machine::MachineKind;
use crate::entity::params::ParamMap;
use crate::entity::{MAX_NAME_LEN, now};
use crate::validation::ValidationError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub id: PresetId,
    pub name: String,
    /// Which machine kind this preset configures
    pub kind: MachineKind,
    /// Owned machine instance, cascade-deleted with the preset
    pub machine: MachineId,
    /// Owning pool; nullified when the pool goes away
    pub pool: Option<PresetPoolId>,
    pub params: ParamMap,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Preset {
    pub fn new(name: impl Into<String>, kind: MachineKind, machine: MachineId) -> Self {
        let stamp = now();
        Self {
            id: PresetId::new(),
            name: name.into(),
            kind,
            machine,
            pool: None,
            params: ParamMap::new(),
            tags: Vec::new(),
            category: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty("Preset", "name"));
        }
        if trimmed.len() > MAX_NAME_LEN {
            return Err(ValidationError::too_long(
                "Preset",
                "name",
                trimmed.len(),
                MAX_NAME_LEN,
            ));
        }
        self.name = name;
        self.touch();
        Ok(())
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
            self.touch();
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

/// Per-project preset collection; cascade-deleted with the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetPool {
    pub id: PresetPoolId,
    pub project: ProjectId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PresetPool {
    pub fn new(project: ProjectId) -> Self {
        let stamp = now();
        Self {
            id: PresetPoolId::new(),
            project,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_defaults() {
        let preset = Preset::new("Deep Bass", MachineKind::Voice, MachineId::new());
        assert_eq!(preset.name, "Deep Bass");
        assert_eq!(preset.kind, MachineKind::Voice);
        assert!(preset.pool.is_none());
        assert!(preset.tags.is_empty());
    }

    #[test]
    fn test_add_tag_deduplicates() {
        let mut preset = Preset::new("Deep Bass", MachineKind::Voice, MachineId::new());
        preset.add_tag("bass");
        preset.add_tag("bass");
        preset.add_tag("dark");
        assert_eq!(preset.tags, vec!["bass".to_string(), "dark".to_string()]);
    }
}
