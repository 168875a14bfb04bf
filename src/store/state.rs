// Arena state: every entity arena keyed by its typed id.
// A StoreState is a plain value; the transactional machinery in
// `transaction.rs` decides when one becomes the committed snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entity::{
    FxSettings, FxSettingsId, Kit, KitId, Machine, MachineId, MixerSettings, MixerSettingsId,
    ParameterLock, ParameterLockId, Pattern, PatternId, Preset, PresetId, PresetPool,
    PresetPoolId, Project, ProjectId, Track, TrackId, Trig, TrigId,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    pub projects: HashMap<ProjectId, Project>,
    pub patterns: HashMap<PatternId, Pattern>,
    pub kits: HashMap<KitId, Kit>,
    pub tracks: HashMap<TrackId, Track>,
    pub trigs: HashMap<TrigId, Trig>,
    pub parameter_locks: HashMap<ParameterLockId, ParameterLock>,
    pub presets: HashMap<PresetId, Preset>,
    pub machines: HashMap<MachineId, Machine>,
    pub preset_pools: HashMap<PresetPoolId, PresetPool>,
    pub mixer_settings: HashMap<MixerSettingsId, MixerSettings>,
    pub fx_settings: HashMap<FxSettingsId, FxSettings>,
}

impl StoreState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_count(&self) -> usize {
        self.projects.len()
            + self.patterns.len()
            + self.kits.len()
            + self.tracks.len()
            + self.trigs.len()
            + self.parameter_locks.len()
            + self.presets.len()
            + self.machines.len()
            + self.preset_pools.len()
            + self.mixer_settings.len()
            + self.fx_settings.len()
    }

    // Relationship queries. Arena maps are unordered, so everything that
    // feeds validation or playback comes back sorted on a stable key.

    pub fn patterns_of_project(&self, project: ProjectId) -> Vec<&Pattern> {
        let mut out: Vec<&Pattern> = self
            .patterns
            .values()
            .filter(|p| p.project == project)
            .collect();
        out.sort_by_key(|p| p.id);
        out
    }

    pub fn pools_of_project(&self, project: ProjectId) -> Vec<&PresetPool> {
        let mut out: Vec<&PresetPool> = self
            .preset_pools
            .values()
            .filter(|p| p.project == project)
            .collect();
        out.sort_by_key(|p| p.id);
        out
    }

    pub fn mixers_of_project(&self, project: ProjectId) -> Vec<&MixerSettings> {
        let mut out: Vec<&MixerSettings> = self
            .mixer_settings
            .values()
            .filter(|m| m.project == project)
            .collect();
        out.sort_by_key(|m| m.id);
        out
    }

    /// Tracks of a pattern ordered by slot index
    pub fn tracks_of_pattern(&self, pattern: PatternId) -> Vec<&Track> {
        let mut out: Vec<&Track> = self
            .tracks
            .values()
            .filter(|t| t.pattern == pattern)
            .collect();
        out.sort_by_key(|t| (t.slot, t.id));
        out
    }

    /// Tracks of a kit ordered by slot index
    pub fn tracks_of_kit(&self, kit: KitId) -> Vec<&Track> {
        let mut out: Vec<&Track> = self.tracks.values().filter(|t| t.kit == kit).collect();
        out.sort_by_key(|t| (t.slot, t.id));
        out
    }

    /// Trigs of a track ordered by step index
    pub fn trigs_of_track(&self, track: TrackId) -> Vec<&Trig> {
        let mut out: Vec<&Trig> = self.trigs.values().filter(|t| t.track == track).collect();
        out.sort_by_key(|t| (t.step, t.id));
        out
    }

    pub fn locks_of_trig(&self, trig: TrigId) -> Vec<&ParameterLock> {
        let mut out: Vec<&ParameterLock> = self
            .parameter_locks
            .values()
            .filter(|l| l.trig == trig)
            .collect();
        out.sort_by_key(|l| l.id);
        out
    }

    pub fn fx_of_kit(&self, kit: KitId) -> Vec<&FxSettings> {
        let mut out: Vec<&FxSettings> = self.fx_settings.values().filter(|f| f.kit == kit).collect();
        out.sort_by_key(|f| f.id);
        out
    }

    pub fn track_count(&self, pattern: PatternId) -> usize {
        self.tracks.values().filter(|t| t.pattern == pattern).count()
    }

    pub fn trig_count(&self, pattern: PatternId) -> usize {
        self.trigs.values().filter(|t| t.pattern == pattern).count()
    }

    /// Patterns currently referencing a kit
    pub fn patterns_of_kit(&self, kit: KitId) -> Vec<&Pattern> {
        let mut out: Vec<&Pattern> = self
            .patterns
            .values()
            .filter(|p| p.kit == Some(kit))
            .collect();
        out.sort_by_key(|p| p.id);
        out
    }
}
