// Transactional store: single writer, synchronous, last-committed-wins.
// Readers only ever see committed immutable snapshots; a transaction works
// on a private copy that becomes the snapshot atomically at commit.

use std::collections::HashSet;
use std::sync::Arc;

use crate::entity::{
    FxSettings, FxSettingsId, Kit, KitId, Machine, MachineId, MixerSettings, ParameterLock,
    ParameterLockId, Pattern, PatternId, Preset, PresetId, Project, ProjectId, Track, TrackId,
    Trig, TrigId,
};
use crate::store::delete_rules;
use crate::store::state::StoreState;
use crate::validation::{self, ValidationError};

/// Errors from store operations themselves (as opposed to validation
/// rule violations, which commit wraps in [`StoreError::Rejected`]).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown {kind} id {id}")]
    UnknownId { kind: &'static str, id: String },

    #[error("pattern already has a kit assigned")]
    KitAlreadyAssigned,

    #[error("track has no preset assigned")]
    NoPresetAssigned,

    #[error("target track slot already has a preset")]
    SlotOccupied,

    #[error("commit rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("loaded state failed validation ({} violations, first: {})", .0.len(), .0[0])]
    InvalidState(Vec<ValidationError>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn unknown<T: std::fmt::Display>(kind: &'static str, id: T) -> Self {
        Self::UnknownId {
            kind,
            id: id.to_string(),
        }
    }
}

/// A committed, immutable view of the store. Cheap to clone; safe to hand
/// to the playback scheduler or UI while the writer keeps mutating.
#[derive(Debug, Clone)]
pub struct Snapshot {
    state: Arc<StoreState>,
    generation: u64,
}

impl Snapshot {
    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// Monotonic commit counter; bumps once per successful commit
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The single-writer store.
#[derive(Debug)]
pub struct Store {
    committed: Arc<StoreState>,
    generation: u64,
}

impl Store {
    pub fn new() -> Self {
        Self {
            committed: Arc::new(StoreState::new()),
            generation: 0,
        }
    }

    /// Adopt an existing state (e.g. one loaded from disk) as generation 0.
    pub fn from_state(state: StoreState) -> Self {
        Self {
            committed: Arc::new(state),
            generation: 0,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: Arc::clone(&self.committed),
            generation: self.generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Begin a unit of work on a private copy of the committed state.
    pub fn begin(&mut self) -> Transaction<'_> {
        Transaction {
            working: (*self.committed).clone(),
            touched_projects: HashSet::new(),
            store: self,
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// One unit of work. All typed mutations run against the working copy;
/// nothing is observable outside until `commit` succeeds.
pub struct Transaction<'a> {
    store: &'a mut Store,
    working: StoreState,
    touched_projects: HashSet<ProjectId>,
}

impl Transaction<'_> {
    /// The candidate state as mutated so far
    pub fn state(&self) -> &StoreState {
        &self.working
    }

    pub(crate) fn state_mut(&mut self) -> &mut StoreState {
        &mut self.working
    }

    /// Mark a project modified; its `updated_at` is re-stamped at commit.
    pub(crate) fn mark_project_modified(&mut self, project: ProjectId) {
        self.touched_projects.insert(project);
    }

    pub(crate) fn mark_pattern_chain(&mut self, pattern: PatternId) {
        if let Some(project) = self.working.patterns.get(&pattern).map(|p| p.project) {
            self.touched_projects.insert(project);
        }
    }

    // Typed lookups

    pub fn project(&self, id: ProjectId) -> Result<&Project, StoreError> {
        self.working
            .projects
            .get(&id)
            .ok_or_else(|| StoreError::unknown("Project", id))
    }

    pub fn pattern(&self, id: PatternId) -> Result<&Pattern, StoreError> {
        self.working
            .patterns
            .get(&id)
            .ok_or_else(|| StoreError::unknown("Pattern", id))
    }

    pub fn kit(&self, id: KitId) -> Result<&Kit, StoreError> {
        self.working
            .kits
            .get(&id)
            .ok_or_else(|| StoreError::unknown("Kit", id))
    }

    pub fn track(&self, id: TrackId) -> Result<&Track, StoreError> {
        self.working
            .tracks
            .get(&id)
            .ok_or_else(|| StoreError::unknown("Track", id))
    }

    pub fn trig(&self, id: TrigId) -> Result<&Trig, StoreError> {
        self.working
            .trigs
            .get(&id)
            .ok_or_else(|| StoreError::unknown("Trig", id))
    }

    pub fn preset(&self, id: PresetId) -> Result<&Preset, StoreError> {
        self.working
            .presets
            .get(&id)
            .ok_or_else(|| StoreError::unknown("Preset", id))
    }

    pub fn machine(&self, id: MachineId) -> Result<&Machine, StoreError> {
        self.working
            .machines
            .get(&id)
            .ok_or_else(|| StoreError::unknown("Machine", id))
    }

    pub fn parameter_lock(&self, id: ParameterLockId) -> Result<&ParameterLock, StoreError> {
        self.working
            .parameter_locks
            .get(&id)
            .ok_or_else(|| StoreError::unknown("ParameterLock", id))
    }

    pub fn fx_settings(&self, id: FxSettingsId) -> Result<&FxSettings, StoreError> {
        self.working
            .fx_settings
            .get(&id)
            .ok_or_else(|| StoreError::unknown("FxSettings", id))
    }

    // Typed mutations. Each runs a closure against one entity and marks
    // the owning project chain modified.

    pub fn with_project<R>(
        &mut self,
        id: ProjectId,
        f: impl FnOnce(&mut Project) -> R,
    ) -> Result<R, StoreError> {
        let project = self
            .working
            .projects
            .get_mut(&id)
            .ok_or_else(|| StoreError::unknown("Project", id))?;
        let out = f(project);
        self.touched_projects.insert(id);
        Ok(out)
    }

    pub fn with_pattern<R>(
        &mut self,
        id: PatternId,
        f: impl FnOnce(&mut Pattern) -> R,
    ) -> Result<R, StoreError> {
        let pattern = self
            .working
            .patterns
            .get_mut(&id)
            .ok_or_else(|| StoreError::unknown("Pattern", id))?;
        let project = pattern.project;
        let out = f(pattern);
        self.touched_projects.insert(project);
        Ok(out)
    }

    pub fn with_kit<R>(
        &mut self,
        id: KitId,
        f: impl FnOnce(&mut Kit) -> R,
    ) -> Result<R, StoreError> {
        // Kits are shared across patterns; no direct project chain
        let kit = self
            .working
            .kits
            .get_mut(&id)
            .ok_or_else(|| StoreError::unknown("Kit", id))?;
        Ok(f(kit))
    }

    pub fn with_track<R>(
        &mut self,
        id: TrackId,
        f: impl FnOnce(&mut Track) -> R,
    ) -> Result<R, StoreError> {
        let track = self
            .working
            .tracks
            .get_mut(&id)
            .ok_or_else(|| StoreError::unknown("Track", id))?;
        let pattern = track.pattern;
        let out = f(track);
        self.mark_pattern_chain(pattern);
        Ok(out)
    }

    pub fn with_trig<R>(
        &mut self,
        id: TrigId,
        f: impl FnOnce(&mut Trig) -> R,
    ) -> Result<R, StoreError> {
        let trig = self
            .working
            .trigs
            .get_mut(&id)
            .ok_or_else(|| StoreError::unknown("Trig", id))?;
        let pattern = trig.pattern;
        let out = f(trig);
        self.mark_pattern_chain(pattern);
        Ok(out)
    }

    pub fn with_parameter_lock<R>(
        &mut self,
        id: ParameterLockId,
        f: impl FnOnce(&mut ParameterLock) -> R,
    ) -> Result<R, StoreError> {
        let lock = self
            .working
            .parameter_locks
            .get_mut(&id)
            .ok_or_else(|| StoreError::unknown("ParameterLock", id))?;
        let trig = lock.trig;
        let out = f(lock);
        if let Some(pattern) = self.working.trigs.get(&trig).map(|t| t.pattern) {
            self.mark_pattern_chain(pattern);
        }
        Ok(out)
    }

    pub fn with_machine<R>(
        &mut self,
        id: MachineId,
        f: impl FnOnce(&mut Machine) -> R,
    ) -> Result<R, StoreError> {
        let machine = self
            .working
            .machines
            .get_mut(&id)
            .ok_or_else(|| StoreError::unknown("Machine", id))?;
        Ok(f(machine))
    }

    pub fn with_preset<R>(
        &mut self,
        id: PresetId,
        f: impl FnOnce(&mut Preset) -> R,
    ) -> Result<R, StoreError> {
        let preset = self
            .working
            .presets
            .get_mut(&id)
            .ok_or_else(|| StoreError::unknown("Preset", id))?;
        Ok(f(preset))
    }

    pub fn with_mixer<R>(
        &mut self,
        project: ProjectId,
        f: impl FnOnce(&mut MixerSettings) -> R,
    ) -> Result<R, StoreError> {
        let mixer = self
            .working
            .mixer_settings
            .values_mut()
            .find(|m| m.project == project)
            .ok_or_else(|| StoreError::unknown("MixerSettings", project))?;
        let out = f(mixer);
        self.touched_projects.insert(project);
        Ok(out)
    }

    pub fn with_fx_settings<R>(
        &mut self,
        kit: KitId,
        f: impl FnOnce(&mut FxSettings) -> R,
    ) -> Result<R, StoreError> {
        let fx = self
            .working
            .fx_settings
            .values_mut()
            .find(|f| f.kit == kit)
            .ok_or_else(|| StoreError::unknown("FxSettings", kit))?;
        Ok(f(fx))
    }

    // Deletes. Only subtree roots are deletable from outside; removing a
    // lone track or trig would break the structural invariants.

    pub fn delete_project(&mut self, id: ProjectId) -> Result<(), StoreError> {
        self.project(id)?;
        self.touched_projects.remove(&id);
        let removed = delete_rules::delete_project(&mut self.working, id);
        log::debug!("delete_project {id}: {removed} entities removed");
        Ok(())
    }

    pub fn delete_pattern(&mut self, id: PatternId) -> Result<(), StoreError> {
        let project = self.pattern(id)?.project;
        let removed = delete_rules::delete_pattern(&mut self.working, id);
        if self.working.projects.contains_key(&project) {
            self.touched_projects.insert(project);
        }
        log::debug!("delete_pattern {id}: {removed} entities removed");
        Ok(())
    }

    pub fn delete_kit(&mut self, id: KitId) -> Result<(), StoreError> {
        self.kit(id)?;
        let referencing: Vec<PatternId> =
            self.working.patterns_of_kit(id).iter().map(|p| p.id).collect();
        let removed = delete_rules::delete_kit(&mut self.working, id);
        for pattern in referencing {
            self.mark_pattern_chain(pattern);
        }
        log::debug!("delete_kit {id}: {removed} entities removed");
        Ok(())
    }

    pub fn delete_preset(&mut self, id: PresetId) -> Result<(), StoreError> {
        self.preset(id)?;
        let removed = delete_rules::delete_preset(&mut self.working, id);
        log::debug!("delete_preset {id}: {removed} entities removed");
        Ok(())
    }

    /// Validate the working state without committing (collect-all), for
    /// UI-facing bulk feedback.
    pub fn check(&self) -> Result<(), Vec<ValidationError>> {
        validation::validate(&self.working)
    }

    /// Validate fail-fast and atomically publish the working copy as the
    /// new committed snapshot.
    pub fn commit(mut self) -> Result<Snapshot, StoreError> {
        let stamp = crate::entity::now();
        for project in std::mem::take(&mut self.touched_projects) {
            if let Some(project) = self.working.projects.get_mut(&project) {
                project.updated_at = stamp;
            }
        }

        validation::validate_fail_fast(&self.working)?;

        self.store.committed = Arc::new(self.working);
        self.store.generation += 1;
        log::debug!("commit: generation {}", self.store.generation);
        Ok(self.store.snapshot())
    }

    /// Discard the unit of work. Dropping the transaction does the same.
    pub fn rollback(self) {
        log::debug!("rollback: discarding working copy");
        drop(self);
    }
}
