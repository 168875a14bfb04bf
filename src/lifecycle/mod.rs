// Lifecycle & defaults manager: creation with populated defaults, atomic
// structural operations (kit slot population, pattern length change,
// duplication) and attach/detach of shared references.
//
// Everything here runs inside a transaction's working copy, so each
// operation is all-or-nothing at commit.

use crate::entity::{
    FxSettings, Kit, KitId, Machine, MachineKind, MixerSettings, ParameterLock, ParameterLockId,
    Pattern, PatternId, Preset, PresetId, PresetPool, Project, ProjectId, Track, TrackId, Trig,
    TrigId,
};
use crate::entity::project::MAX_PATTERNS_PER_PROJECT;
use crate::store::{StoreError, Transaction};
use crate::validation::ValidationError;

impl Transaction<'_> {
    /// Create a project with its preset pool and mixer settings.
    pub fn create_project(&mut self, name: impl Into<String>) -> ProjectId {
        let project = Project::new(name);
        let id = project.id;
        let pool = PresetPool::new(id);
        let mixer = MixerSettings::new(id);

        let state = self.state_mut();
        state.projects.insert(id, project);
        state.preset_pools.insert(pool.id, pool);
        state.mixer_settings.insert(mixer.id, mixer);
        self.mark_project_modified(id);
        log::debug!("create_project {id}");
        id
    }

    /// Create a pattern with defaults, inheriting the project tempo.
    pub fn create_pattern(
        &mut self,
        project: ProjectId,
        name: impl Into<String>,
    ) -> Result<PatternId, StoreError> {
        let tempo = self.project(project)?.tempo;
        let count = self.state().patterns_of_project(project).len();
        if count >= MAX_PATTERNS_PER_PROJECT {
            return Err(StoreError::Rejected(ValidationError::count_exceeded(
                "Project",
                "patterns",
                count + 1,
                MAX_PATTERNS_PER_PROJECT,
            )));
        }

        let pattern = Pattern::new(project, name, tempo);
        let id = pattern.id;
        self.state_mut().patterns.insert(id, pattern);
        self.mark_project_modified(project);
        Ok(id)
    }

    /// Create a kit bound to a pattern, eagerly filling all 16 track
    /// slots and the full trig grid (one trig per track per step).
    pub fn create_kit(
        &mut self,
        pattern: PatternId,
        name: impl Into<String>,
    ) -> Result<KitId, StoreError> {
        let (project, length, existing_kit) = {
            let p = self.pattern(pattern)?;
            (p.project, p.length, p.kit)
        };
        if existing_kit.is_some() {
            return Err(StoreError::KitAlreadyAssigned);
        }

        let kit = Kit::new(name);
        let kit_id = kit.id;
        let fx = FxSettings::new(kit_id);

        let state = self.state_mut();
        state.kits.insert(kit_id, kit);
        state.fx_settings.insert(fx.id, fx);

        for slot in 0..Kit::TRACK_SLOTS as u8 {
            let track = Track::new(pattern, kit_id, slot);
            let track_id = track.id;
            state.tracks.insert(track_id, track);
            for step in 0..length {
                let trig = Trig::new(track_id, pattern, step);
                state.trigs.insert(trig.id, trig);
            }
        }

        if let Some(p) = state.patterns.get_mut(&pattern) {
            p.kit = Some(kit_id);
            p.touch();
        }

        self.mark_project_modified(project);
        log::debug!(
            "create_kit {kit_id}: {} slots, {} trigs",
            Kit::TRACK_SLOTS,
            Kit::TRACK_SLOTS as u32 * length
        );
        Ok(kit_id)
    }

    /// Change a pattern's length in one atomic unit: growth appends
    /// default trigs to every track, shrink deletes the trigs past the
    /// new length. The grid invariant holds again before commit.
    pub fn change_length(&mut self, pattern: PatternId, new_length: u32) -> Result<(), StoreError> {
        if !(Pattern::MIN_LENGTH..=Pattern::MAX_LENGTH).contains(&new_length) {
            return Err(StoreError::Rejected(ValidationError::out_of_range(
                "Pattern",
                "length",
                new_length,
                Pattern::MIN_LENGTH,
                Pattern::MAX_LENGTH,
            )));
        }

        let old_length = self.pattern(pattern)?.length;
        if old_length == new_length {
            return Ok(());
        }

        let track_ids: Vec<TrackId> = self
            .state()
            .tracks_of_pattern(pattern)
            .iter()
            .map(|t| t.id)
            .collect();

        let state = self.state_mut();
        if new_length > old_length {
            for track in &track_ids {
                for step in old_length..new_length {
                    let trig = Trig::new(*track, pattern, step);
                    state.trigs.insert(trig.id, trig);
                }
            }
        } else {
            let doomed: Vec<TrigId> = state
                .trigs
                .values()
                .filter(|t| t.pattern == pattern && t.step >= new_length)
                .map(|t| t.id)
                .collect();
            for trig in doomed {
                crate::store::delete_rules::delete_trig(state, trig);
            }
        }

        if let Some(p) = state.patterns.get_mut(&pattern) {
            p.length = new_length;
            p.touch();
        }
        self.mark_pattern_chain(pattern);
        log::debug!("change_length {pattern}: {old_length} -> {new_length}");
        Ok(())
    }

    /// Deep-copy a pattern subtree under a fresh identity.
    pub fn duplicate_pattern(&mut self, pattern: PatternId) -> Result<PatternId, StoreError> {
        self.pattern(pattern)?;
        let copy = crate::store::duplicate_pattern(self.state_mut(), pattern)
            .ok_or_else(|| StoreError::unknown("Pattern", pattern))?;
        self.mark_pattern_chain(copy);
        log::debug!("duplicate_pattern {pattern} -> {copy}");
        Ok(copy)
    }

    /// Create a preset (and its owned machine) inside a project's pool.
    pub fn create_preset(
        &mut self,
        project: ProjectId,
        name: impl Into<String>,
        kind: MachineKind,
        type_name: impl Into<String>,
    ) -> Result<PresetId, StoreError> {
        let pool = self
            .state()
            .pools_of_project(project)
            .first()
            .map(|p| p.id)
            .ok_or_else(|| StoreError::unknown("PresetPool", project))?;

        let machine = Machine::new(kind, type_name);
        let machine_id = machine.id;
        let mut preset = Preset::new(name, kind, machine_id);
        preset.pool = Some(pool);
        let preset_id = preset.id;

        let state = self.state_mut();
        state.machines.insert(machine_id, machine);
        state.presets.insert(preset_id, preset);
        self.mark_project_modified(project);
        Ok(preset_id)
    }

    /// Attach a preset to a track slot.
    pub fn assign_preset(&mut self, track: TrackId, preset: PresetId) -> Result<(), StoreError> {
        self.preset(preset)?;
        self.with_track(track, |t| {
            t.preset = Some(preset);
            t.touch();
        })
    }

    /// Detach a track's preset reference, leaving the preset alive.
    pub fn clear_preset(&mut self, track: TrackId) -> Result<(), StoreError> {
        self.with_track(track, |t| {
            t.preset = None;
            t.touch();
        })
    }

    /// Reparent: move the machine-bearing preset from one track slot to
    /// another. The target slot must be empty.
    pub fn move_preset(&mut self, from: TrackId, to: TrackId) -> Result<(), StoreError> {
        let preset = self.track(from)?.preset.ok_or(StoreError::NoPresetAssigned)?;
        if self.track(to)?.preset.is_some() {
            return Err(StoreError::SlotOccupied);
        }
        self.with_track(from, |t| {
            t.preset = None;
            t.touch();
        })?;
        self.with_track(to, |t| {
            t.preset = Some(preset);
            t.touch();
        })
    }

    /// Link a preset into a kit's shared preset set.
    pub fn link_preset_to_kit(&mut self, kit: KitId, preset: PresetId) -> Result<(), StoreError> {
        self.preset(preset)?;
        self.with_kit(kit, |k| {
            if !k.presets.contains(&preset) {
                k.presets.push(preset);
                k.touch();
            }
        })
    }

    pub fn unlink_preset_from_kit(
        &mut self,
        kit: KitId,
        preset: PresetId,
    ) -> Result<(), StoreError> {
        self.with_kit(kit, |k| {
            k.presets.retain(|p| *p != preset);
            k.touch();
        })
    }

    /// Add a per-step parameter override to a trig.
    pub fn add_parameter_lock(
        &mut self,
        trig: TrigId,
        parameter: impl Into<String>,
        value: f32,
    ) -> Result<ParameterLockId, StoreError> {
        let (step, pattern) = {
            let t = self.trig(trig)?;
            (t.step, t.pattern)
        };
        let lock = ParameterLock::new(trig, step, parameter, value);
        let id = lock.id;
        self.state_mut().parameter_locks.insert(id, lock);
        self.with_trig(trig, |t| t.touch())?;
        self.mark_pattern_chain(pattern);
        Ok(id)
    }

    pub fn remove_parameter_lock(&mut self, lock: ParameterLockId) -> Result<(), StoreError> {
        let trig = self.parameter_lock(lock)?.trig;
        self.state_mut().parameter_locks.remove(&lock);
        self.with_trig(trig, |t| t.touch())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::entity::Kit;
    use crate::store::Store;

    #[test]
    fn test_new_kit_has_sixteen_tracks_immediately() {
        let mut store = Store::new();
        let mut tx = store.begin();
        let project = tx.create_project("Demo");
        let pattern = tx.create_pattern(project, "A").unwrap();
        let kit = tx.create_kit(pattern, "Drums").unwrap();
        let snapshot = tx.commit().unwrap();

        let tracks = snapshot.state().tracks_of_kit(kit);
        assert_eq!(tracks.len(), Kit::TRACK_SLOTS);
        let slots: Vec<u8> = tracks.iter().map(|t| t.slot).collect();
        assert_eq!(slots, (0..16).collect::<Vec<u8>>());
        assert!(tracks.iter().all(|t| t.preset.is_none()));
    }

    #[test]
    fn test_kit_creation_fills_trig_grid() {
        let mut store = Store::new();
        let mut tx = store.begin();
        let project = tx.create_project("Demo");
        let pattern = tx.create_pattern(project, "A").unwrap();
        tx.create_kit(pattern, "Drums").unwrap();
        let snapshot = tx.commit().unwrap();

        let state = snapshot.state();
        assert_eq!(state.trig_count(pattern), state.track_count(pattern) * 16);
    }

    #[test]
    fn test_second_kit_on_same_pattern_rejected() {
        let mut store = Store::new();
        let mut tx = store.begin();
        let project = tx.create_project("Demo");
        let pattern = tx.create_pattern(project, "A").unwrap();
        tx.create_kit(pattern, "Drums").unwrap();
        assert!(matches!(
            tx.create_kit(pattern, "Synths"),
            Err(crate::store::StoreError::KitAlreadyAssigned)
        ));
    }

    #[test]
    fn test_grow_length_appends_default_trigs() {
        let mut store = Store::new();
        let mut tx = store.begin();
        let project = tx.create_project("Demo");
        let pattern = tx.create_pattern(project, "A").unwrap();
        tx.create_kit(pattern, "Drums").unwrap();
        tx.change_length(pattern, 32).unwrap();
        let snapshot = tx.commit().unwrap();

        let state = snapshot.state();
        assert_eq!(state.patterns.get(&pattern).unwrap().length, 32);
        assert_eq!(state.trig_count(pattern), 16 * 32);
        for track in state.tracks_of_pattern(pattern) {
            let trigs = state.trigs_of_track(track.id);
            assert_eq!(trigs.len(), 32);
            assert!(trigs.iter().all(|t| t.step < 32));
        }
    }

    #[test]
    fn test_shrink_length_deletes_trailing_trigs() {
        let mut store = Store::new();
        let mut tx = store.begin();
        let project = tx.create_project("Demo");
        let pattern = tx.create_pattern(project, "A").unwrap();
        tx.create_kit(pattern, "Drums").unwrap();
        tx.change_length(pattern, 32).unwrap();
        tx.change_length(pattern, 16).unwrap();
        let snapshot = tx.commit().unwrap();

        let state = snapshot.state();
        assert_eq!(state.trig_count(pattern), 16 * 16);
        assert!(state.trigs.values().all(|t| t.step < 16));
    }

    #[test]
    fn test_move_preset_between_slots() {
        let mut store = Store::new();
        let mut tx = store.begin();
        let project = tx.create_project("Demo");
        let pattern = tx.create_pattern(project, "A").unwrap();
        tx.create_kit(pattern, "Drums").unwrap();
        let preset = tx
            .create_preset(project, "Kick", crate::entity::MachineKind::Voice, "analog")
            .unwrap();

        let tracks: Vec<_> = tx
            .state()
            .tracks_of_pattern(pattern)
            .iter()
            .map(|t| t.id)
            .collect();
        tx.assign_preset(tracks[0], preset).unwrap();
        tx.move_preset(tracks[0], tracks[1]).unwrap();

        assert!(tx.track(tracks[0]).unwrap().preset.is_none());
        assert_eq!(tx.track(tracks[1]).unwrap().preset, Some(preset));
        tx.commit().unwrap();
    }

    #[test]
    fn test_parameter_lock_add_and_remove() {
        let mut store = Store::new();
        let mut tx = store.begin();
        let project = tx.create_project("Demo");
        let pattern = tx.create_pattern(project, "A").unwrap();
        tx.create_kit(pattern, "Drums").unwrap();

        let track = tx.state().tracks_of_pattern(pattern)[0].id;
        let trig = tx.state().trigs_of_track(track)[3].id;
        let lock = tx.add_parameter_lock(trig, "cutoff", 0.7).unwrap();

        let stored = tx.parameter_lock(lock).unwrap();
        assert_eq!(stored.step, 3);
        assert_eq!(stored.parameter, "cutoff");

        tx.remove_parameter_lock(lock).unwrap();
        assert!(tx.parameter_lock(lock).is_err());
        tx.commit().unwrap();
    }
}
