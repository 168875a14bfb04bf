// Validation engine: commit-time rule checks over a candidate state.
// Runs only at commit boundaries, never mid-edit. Two modes: fail-fast
// (transactional writes) and collect-all (UI bulk feedback).

pub mod error;
mod rules;

pub use error::ValidationError;

use std::collections::HashMap;

use crate::store::StoreState;

/// How the engine reports violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Stop at the first violation
    FailFast,
    /// Accumulate every violation in one pass
    CollectAll,
}

/// Validate a candidate state, accumulating every violation.
pub fn validate(state: &StoreState) -> Result<(), Vec<ValidationError>> {
    let errors = run(state, Mode::CollectAll);
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Validate a candidate state, stopping at the first violation.
pub fn validate_fail_fast(state: &StoreState) -> Result<(), ValidationError> {
    let mut errors = run(state, Mode::FailFast);
    match errors.is_empty() {
        true => Ok(()),
        false => Err(errors.remove(0)),
    }
}

/// HashMap arenas iterate in arbitrary order; walk values sorted by id so
/// fail-fast picks a deterministic first violation.
fn sorted_values<K: Ord + Copy, V>(map: &HashMap<K, V>) -> Vec<&V> {
    let mut entries: Vec<(&K, &V)> = map.iter().collect();
    entries.sort_by_key(|(k, _)| **k);
    entries.into_iter().map(|(_, v)| v).collect()
}

fn run(state: &StoreState, mode: Mode) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    macro_rules! check {
        ($batch:expr) => {
            errors.extend($batch);
            if mode == Mode::FailFast && !errors.is_empty() {
                return errors;
            }
        };
    }

    for project in sorted_values(&state.projects) {
        check!(rules::project_errors(state, project));
    }
    for pattern in sorted_values(&state.patterns) {
        check!(rules::pattern_errors(state, pattern));
    }
    for kit in sorted_values(&state.kits) {
        check!(rules::kit_errors(state, kit));
    }
    for track in sorted_values(&state.tracks) {
        check!(rules::track_errors(state, track));
    }
    for trig in sorted_values(&state.trigs) {
        check!(rules::trig_errors(state, trig));
    }
    for lock in sorted_values(&state.parameter_locks) {
        check!(rules::lock_errors(state, lock));
    }
    for machine in sorted_values(&state.machines) {
        check!(rules::machine_errors(machine));
    }
    for preset in sorted_values(&state.presets) {
        check!(rules::preset_errors(state, preset));
    }
    for pool in sorted_values(&state.preset_pools) {
        check!(rules::pool_errors(state, pool));
    }
    for mixer in sorted_values(&state.mixer_settings) {
        check!(rules::mixer_errors(state, mixer));
    }
    for fx in sorted_values(&state.fx_settings) {
        check!(rules::fx_errors(state, fx));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Pattern, Project, ProjectId};
    use crate::entity::preset::PresetPool;
    use crate::entity::project::MixerSettings;

    fn bare_project_state() -> (StoreState, ProjectId) {
        let mut state = StoreState::new();
        let project = Project::new("Demo");
        let id = project.id;
        let pool = PresetPool::new(id);
        let mixer = MixerSettings::new(id);
        state.projects.insert(id, project);
        state.preset_pools.insert(pool.id, pool);
        state.mixer_settings.insert(mixer.id, mixer);
        (state, id)
    }

    #[test]
    fn test_empty_state_is_valid() {
        let state = StoreState::new();
        assert!(validate(&state).is_ok());
        assert!(validate_fail_fast(&state).is_ok());
    }

    #[test]
    fn test_bare_project_is_valid() {
        let (state, _) = bare_project_state();
        assert!(validate(&state).is_ok());
    }

    #[test]
    fn test_collect_all_reports_every_violation() {
        let (mut state, id) = bare_project_state();
        {
            let project = state.projects.get_mut(&id).unwrap();
            project.name = "  ".to_string();
            project.tempo = 20.0;
            project.master_volume = 2.0;
        }

        let errors = validate(&state).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_fail_fast_returns_single_error() {
        let (mut state, id) = bare_project_state();
        {
            let project = state.projects.get_mut(&id).unwrap();
            project.name = String::new();
            project.tempo = 10.0;
        }

        let err = validate_fail_fast(&state).unwrap_err();
        assert_eq!(err, ValidationError::empty("Project", "name"));
    }

    #[test]
    fn test_dangling_pattern_project_link() {
        let mut state = StoreState::new();
        let pattern = Pattern::new(ProjectId::new(), "Orphan", 120.0);
        state.patterns.insert(pattern.id, pattern);

        let errors = validate(&state).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::Relationship {
                entity: "Pattern",
                relationship: "project",
                ..
            }
        )));
    }

    #[test]
    fn test_project_missing_pool_and_mixer_is_capacity_error() {
        let mut state = StoreState::new();
        let project = Project::new("Demo");
        state.projects.insert(project.id, project);

        let errors = validate(&state).unwrap_err();
        let capacity_errors = errors
            .iter()
            .filter(|e| matches!(e, ValidationError::Capacity { .. }))
            .count();
        assert_eq!(capacity_errors, 2);
    }
}
