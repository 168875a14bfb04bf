// Declared delete policy and its executor.
// The table is data; the store executes it atomically inside the working
// copy of a transaction, so a cascade is all-or-nothing by construction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{
    FxSettingsId, KitId, MachineId, MixerSettingsId, ParameterLockId, PatternId, PresetId,
    PresetPoolId, ProjectId, TrackId, TrigId,
};
use crate::store::StoreState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Project,
    Pattern,
    Kit,
    Track,
    Trig,
    ParameterLock,
    Preset,
    Machine,
    PresetPool,
    MixerSettings,
    FxSettings,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Project => "Project",
            Self::Pattern => "Pattern",
            Self::Kit => "Kit",
            Self::Track => "Track",
            Self::Trig => "Trig",
            Self::ParameterLock => "ParameterLock",
            Self::Preset => "Preset",
            Self::Machine => "Machine",
            Self::PresetPool => "PresetPool",
            Self::MixerSettings => "MixerSettings",
            Self::FxSettings => "FxSettings",
        };
        write!(f, "{name}")
    }
}

/// What happens to the child side when the parent is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteRule {
    /// Child records are deleted with the parent
    Cascade,
    /// References to the parent are cleared, child survives
    Nullify,
}

/// The declared delete-rule table. A persistence collaborator consumes
/// this table verbatim; the in-memory executor below implements it.
pub const RULES: &[(EntityKind, EntityKind, DeleteRule)] = &[
    (EntityKind::Project, EntityKind::Pattern, DeleteRule::Cascade),
    (EntityKind::Project, EntityKind::PresetPool, DeleteRule::Cascade),
    (EntityKind::Project, EntityKind::MixerSettings, DeleteRule::Cascade),
    (EntityKind::Pattern, EntityKind::Track, DeleteRule::Cascade),
    (EntityKind::Pattern, EntityKind::Kit, DeleteRule::Nullify),
    (EntityKind::Kit, EntityKind::Pattern, DeleteRule::Nullify),
    (EntityKind::Kit, EntityKind::Preset, DeleteRule::Nullify),
    (EntityKind::Kit, EntityKind::FxSettings, DeleteRule::Cascade),
    (EntityKind::Track, EntityKind::Trig, DeleteRule::Cascade),
    (EntityKind::Track, EntityKind::Preset, DeleteRule::Nullify),
    (EntityKind::Trig, EntityKind::ParameterLock, DeleteRule::Cascade),
    (EntityKind::Preset, EntityKind::Machine, DeleteRule::Cascade),
    (EntityKind::Preset, EntityKind::PresetPool, DeleteRule::Nullify),
    (EntityKind::Preset, EntityKind::Track, DeleteRule::Nullify),
];

pub fn rule_for(parent: EntityKind, child: EntityKind) -> Option<DeleteRule> {
    RULES
        .iter()
        .find(|(p, c, _)| *p == parent && *c == child)
        .map(|(_, _, rule)| *rule)
}

// Executors. Each returns the number of entities removed (the triggering
// entity included) so callers can log the cascade size.

pub(crate) fn delete_project(state: &mut StoreState, id: ProjectId) -> usize {
    if state.projects.remove(&id).is_none() {
        return 0;
    }
    let mut removed = 1;

    let patterns: Vec<PatternId> = state
        .patterns
        .values()
        .filter(|p| p.project == id)
        .map(|p| p.id)
        .collect();
    for pattern in patterns {
        removed += delete_pattern(state, pattern);
    }

    let pools: Vec<PresetPoolId> = state
        .preset_pools
        .values()
        .filter(|p| p.project == id)
        .map(|p| p.id)
        .collect();
    for pool in pools {
        removed += delete_preset_pool(state, pool);
    }

    let mixers: Vec<MixerSettingsId> = state
        .mixer_settings
        .values()
        .filter(|m| m.project == id)
        .map(|m| m.id)
        .collect();
    for mixer in mixers {
        state.mixer_settings.remove(&mixer);
        removed += 1;
    }

    removed
}

pub(crate) fn delete_pattern(state: &mut StoreState, id: PatternId) -> usize {
    let Some(pattern) = state.patterns.remove(&id) else {
        return 0;
    };
    let mut removed = 1;

    // Pattern -> Track: cascade
    let tracks: Vec<TrackId> = state
        .tracks
        .values()
        .filter(|t| t.pattern == id)
        .map(|t| t.id)
        .collect();
    for track in tracks {
        removed += delete_track(state, track);
    }

    // The deleted tracks were the bound kit's 16 slots. A kit no other
    // pattern references would be left slotless and invalid, so it goes
    // with its pattern.
    if let Some(kit) = pattern.kit {
        let still_referenced = state.patterns.values().any(|p| p.kit == Some(kit));
        if !still_referenced {
            removed += delete_kit(state, kit);
        }
    }

    removed
}

pub(crate) fn delete_kit(state: &mut StoreState, id: KitId) -> usize {
    if state.kits.remove(&id).is_none() {
        return 0;
    }
    let mut removed = 1;

    // Kit -> Pattern: nullify
    for pattern in state.patterns.values_mut() {
        if pattern.kit == Some(id) {
            pattern.kit = None;
            pattern.touch();
        }
    }

    // The kit owns its 16 track slots; they go with it
    let tracks: Vec<TrackId> = state
        .tracks
        .values()
        .filter(|t| t.kit == id)
        .map(|t| t.id)
        .collect();
    for track in tracks {
        removed += delete_track(state, track);
    }

    // Kit -> FxSettings: cascade
    let fx: Vec<FxSettingsId> = state
        .fx_settings
        .values()
        .filter(|f| f.kit == id)
        .map(|f| f.id)
        .collect();
    for fx_id in fx {
        state.fx_settings.remove(&fx_id);
        removed += 1;
    }

    removed
}

pub(crate) fn delete_track(state: &mut StoreState, id: TrackId) -> usize {
    if state.tracks.remove(&id).is_none() {
        return 0;
    }
    let mut removed = 1;

    let trigs: Vec<TrigId> = state
        .trigs
        .values()
        .filter(|t| t.track == id)
        .map(|t| t.id)
        .collect();
    for trig in trigs {
        removed += delete_trig(state, trig);
    }

    removed
}

pub(crate) fn delete_trig(state: &mut StoreState, id: TrigId) -> usize {
    if state.trigs.remove(&id).is_none() {
        return 0;
    }
    let mut removed = 1;

    let locks: Vec<ParameterLockId> = state
        .parameter_locks
        .values()
        .filter(|l| l.trig == id)
        .map(|l| l.id)
        .collect();
    for lock in locks {
        state.parameter_locks.remove(&lock);
        removed += 1;
    }

    removed
}

pub(crate) fn delete_preset(state: &mut StoreState, id: PresetId) -> usize {
    let Some(preset) = state.presets.remove(&id) else {
        return 0;
    };
    let mut removed = 1;

    // Preset -> Machine: cascade
    let machine: MachineId = preset.machine;
    if state.machines.remove(&machine).is_some() {
        removed += 1;
    }

    // Preset -> Track: nullify
    for track in state.tracks.values_mut() {
        if track.preset == Some(id) {
            track.preset = None;
            track.touch();
        }
    }
    // Preset -> Kit link: nullify
    for kit in state.kits.values_mut() {
        if kit.presets.contains(&id) {
            kit.presets.retain(|p| *p != id);
            kit.touch();
        }
    }

    removed
}

pub(crate) fn delete_preset_pool(state: &mut StoreState, id: PresetPoolId) -> usize {
    if state.preset_pools.remove(&id).is_none() {
        return 0;
    }

    // Pool deletion only detaches presets; they stay usable by tracks/kits
    for preset in state.presets.values_mut() {
        if preset.pool == Some(id) {
            preset.pool = None;
            preset.touch();
        }
    }

    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_table_lookup() {
        assert_eq!(
            rule_for(EntityKind::Project, EntityKind::Pattern),
            Some(DeleteRule::Cascade)
        );
        assert_eq!(
            rule_for(EntityKind::Pattern, EntityKind::Kit),
            Some(DeleteRule::Nullify)
        );
        assert_eq!(
            rule_for(EntityKind::Trig, EntityKind::ParameterLock),
            Some(DeleteRule::Cascade)
        );
        assert_eq!(rule_for(EntityKind::Track, EntityKind::Pattern), None);
    }

    #[test]
    fn test_every_declared_rule_is_unique() {
        for (i, (p, c, _)) in RULES.iter().enumerate() {
            for (q, d, _) in &RULES[i + 1..] {
                assert!(!(p == q && c == d), "duplicate rule {p} -> {c}");
            }
        }
    }
}
