// Deep duplication of a pattern subtree: fresh identities everywhere,
// no shared mutable state with the source. The bound kit owns the 16
// track slots, so it is deep-copied too; preset references stay shared
// on purpose, they are nullify relationships.

use std::collections::HashMap;

use crate::entity::{now, FxSettingsId, KitId, PatternId, TrackId, TrigId};
use crate::store::state::StoreState;

pub(crate) fn duplicate_pattern(state: &mut StoreState, source: PatternId) -> Option<PatternId> {
    let stamp = now();

    let mut pattern = state.patterns.get(&source)?.clone();
    pattern.id = PatternId::new();
    pattern.name = format!("{} copy", pattern.name);
    pattern.created_at = stamp;
    pattern.updated_at = stamp;
    let new_pattern = pattern.id;

    // A kit partners with one pattern; sharing it would double its slot
    // count, so the copy gets its own kit and effect settings.
    let mut kit_map: HashMap<KitId, KitId> = HashMap::new();
    if let Some(source_kit) = pattern.kit {
        if let Some(kit) = state.kits.get(&source_kit) {
            let mut kit = kit.clone();
            kit.id = KitId::new();
            kit.created_at = stamp;
            kit.updated_at = stamp;
            let new_kit = kit.id;

            let fx_ids: Vec<FxSettingsId> = state
                .fx_settings
                .values()
                .filter(|f| f.kit == source_kit)
                .map(|f| f.id)
                .collect();
            for old_fx in fx_ids {
                let mut fx = state.fx_settings[&old_fx].clone();
                fx.id = FxSettingsId::new();
                fx.kit = new_kit;
                fx.created_at = stamp;
                fx.updated_at = stamp;
                state.fx_settings.insert(fx.id, fx);
            }

            state.kits.insert(new_kit, kit);
            kit_map.insert(source_kit, new_kit);
            pattern.kit = Some(new_kit);
        }
    }

    let mut track_map: HashMap<TrackId, TrackId> = HashMap::new();
    let source_tracks: Vec<TrackId> = state
        .tracks
        .values()
        .filter(|t| t.pattern == source)
        .map(|t| t.id)
        .collect();

    for old_track in &source_tracks {
        let mut track = state.tracks[old_track].clone();
        track.id = TrackId::new();
        track.pattern = new_pattern;
        if let Some(new_kit) = kit_map.get(&track.kit) {
            track.kit = *new_kit;
        }
        track.created_at = stamp;
        track.updated_at = stamp;
        track_map.insert(*old_track, track.id);
        state.tracks.insert(track.id, track);
    }

    let source_trigs: Vec<TrigId> = state
        .trigs
        .values()
        .filter(|t| t.pattern == source)
        .map(|t| t.id)
        .collect();

    for old_trig in &source_trigs {
        let mut trig = state.trigs[old_trig].clone();
        let Some(new_track) = track_map.get(&trig.track) else {
            continue;
        };
        trig.id = TrigId::new();
        trig.track = *new_track;
        trig.pattern = new_pattern;
        trig.created_at = stamp;
        trig.updated_at = stamp;
        let new_trig = trig.id;
        state.trigs.insert(new_trig, trig);

        let locks: Vec<_> = state
            .parameter_locks
            .values()
            .filter(|l| l.trig == *old_trig)
            .map(|l| l.id)
            .collect();
        for old_lock in locks {
            let mut lock = state.parameter_locks[&old_lock].clone();
            lock.id = crate::entity::ParameterLockId::new();
            lock.trig = new_trig;
            lock.created_at = stamp;
            lock.updated_at = stamp;
            state.parameter_locks.insert(lock.id, lock);
        }
    }

    state.patterns.insert(new_pattern, pattern);
    Some(new_pattern)
}
