// Snapshot persistence: one JSON document per store state.
// Loading validates (collect-all) before the state is accepted.

use std::fs;
use std::path::Path;

use crate::store::state::StoreState;
use crate::store::transaction::StoreError;
use crate::validation;

pub fn to_json(state: &StoreState) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(state)?)
}

pub fn from_json(json: &str) -> Result<StoreState, StoreError> {
    let state: StoreState = serde_json::from_str(json)?;
    validation::validate(&state).map_err(StoreError::InvalidState)?;
    Ok(state)
}

pub fn save_to_file(state: &StoreState, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let json = to_json(state)?;
    fs::write(path.as_ref(), json)?;
    log::debug!("saved store state to {}", path.as_ref().display());
    Ok(())
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<StoreState, StoreError> {
    let json = fs::read_to_string(path.as_ref())?;
    let state = from_json(&json)?;
    log::debug!(
        "loaded store state from {} ({} entities)",
        path.as_ref().display(),
        state.entity_count()
    );
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[test]
    fn test_json_round_trip_preserves_arenas() {
        let mut store = Store::new();
        let mut tx = store.begin();
        let project = tx.create_project("Round Trip");
        let pattern = tx.create_pattern(project, "A").unwrap();
        tx.create_kit(pattern, "Drums").unwrap();
        let snapshot = tx.commit().unwrap();

        let json = to_json(snapshot.state()).unwrap();
        let back = from_json(&json).unwrap();

        assert_eq!(back.projects.len(), 1);
        assert_eq!(back.patterns.len(), 1);
        assert_eq!(back.kits.len(), 1);
        assert_eq!(back.tracks.len(), 16);
        assert_eq!(back.trigs.len(), 16 * 16);
        assert_eq!(back.entity_count(), snapshot.state().entity_count());
    }

    #[test]
    fn test_load_rejects_invalid_state() {
        let mut store = Store::new();
        let mut tx = store.begin();
        let project = tx.create_project("Bad");
        let snapshot = tx.commit().unwrap();

        // Corrupt the serialized tempo past the valid range
        let mut state = snapshot.state().clone();
        state.projects.get_mut(&project).unwrap().tempo = 10_000.0;
        let json = serde_json::to_string(&state).unwrap();

        let err = from_json(&json).unwrap_err();
        assert!(matches!(err, StoreError::InvalidState(_)));
    }

    #[test]
    fn test_file_round_trip() {
        let mut store = Store::new();
        let mut tx = store.begin();
        let project = tx.create_project("On Disk");
        tx.create_pattern(project, "A").unwrap();
        let snapshot = tx.commit().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        save_to_file(snapshot.state(), &path).unwrap();

        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.entity_count(), snapshot.state().entity_count());
    }
}
