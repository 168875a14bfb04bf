// Per-entity rule checks. Each function returns every violation for one
// entity; mode handling (fail-fast vs collect-all) lives in mod.rs.

use chrono::{DateTime, Duration, Utc};

use crate::entity::kit::Kit;
use crate::entity::pattern::Pattern;
use crate::entity::preset::{Preset, PresetPool};
use crate::entity::project::{MixerSettings, Project};
use crate::entity::track::Track;
use crate::entity::trig::{ParameterLock, Trig};
use crate::entity::{FxSettings, Machine, MachineCapability, MAX_NAME_LEN, TEMPO_MAX, TEMPO_MIN};
use crate::store::StoreState;
use crate::validation::ValidationError;

use crate::entity::project::MAX_PATTERNS_PER_PROJECT;

/// Clock-jitter allowance for the non-future rule
const FUTURE_TOLERANCE_SECS: i64 = 5;

fn check_name(entity: &'static str, name: &str, errors: &mut Vec<ValidationError>) {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        errors.push(ValidationError::empty(entity, "name"));
    } else if trimmed.len() > MAX_NAME_LEN {
        errors.push(ValidationError::too_long(
            entity,
            "name",
            trimmed.len(),
            MAX_NAME_LEN,
        ));
    }
}

fn check_dates(
    entity: &'static str,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    errors: &mut Vec<ValidationError>,
) {
    if created > updated {
        errors.push(ValidationError::date(
            entity,
            "updated_at",
            format!("updated_at {updated} precedes created_at {created}"),
        ));
    }
    let horizon = Utc::now() + Duration::seconds(FUTURE_TOLERANCE_SECS);
    if created > horizon {
        errors.push(ValidationError::date(
            entity,
            "created_at",
            format!("timestamp {created} is in the future"),
        ));
    }
    if updated > horizon {
        errors.push(ValidationError::date(
            entity,
            "updated_at",
            format!("timestamp {updated} is in the future"),
        ));
    }
}

fn check_unit(
    entity: &'static str,
    field: &'static str,
    value: f32,
    errors: &mut Vec<ValidationError>,
) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ValidationError::out_of_range(entity, field, value, 0.0, 1.0));
    }
}

pub(super) fn project_errors(state: &StoreState, project: &Project) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    check_name("Project", &project.name, &mut errors);
    if !(TEMPO_MIN..=TEMPO_MAX).contains(&project.tempo) {
        errors.push(ValidationError::out_of_range(
            "Project",
            "tempo",
            project.tempo,
            TEMPO_MIN,
            TEMPO_MAX,
        ));
    }
    check_unit("Project", "master_volume", project.master_volume, &mut errors);
    check_unit("Project", "master_swing", project.master_swing, &mut errors);
    check_dates("Project", project.created_at, project.updated_at, &mut errors);

    let pattern_count = state.patterns_of_project(project.id).len();
    if pattern_count > MAX_PATTERNS_PER_PROJECT {
        errors.push(ValidationError::count_exceeded(
            "Project",
            "patterns",
            pattern_count,
            MAX_PATTERNS_PER_PROJECT,
        ));
    }

    let pools = state.pools_of_project(project.id).len();
    if pools != 1 {
        errors.push(ValidationError::Capacity {
            entity: "Project",
            relationship: "preset_pool",
            expected: 1,
            actual: pools,
        });
    }
    let mixers = state.mixers_of_project(project.id).len();
    if mixers != 1 {
        errors.push(ValidationError::Capacity {
            entity: "Project",
            relationship: "mixer_settings",
            expected: 1,
            actual: mixers,
        });
    }

    errors
}

pub(super) fn pattern_errors(state: &StoreState, pattern: &Pattern) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    check_name("Pattern", &pattern.name, &mut errors);
    if !(Pattern::MIN_LENGTH..=Pattern::MAX_LENGTH).contains(&pattern.length) {
        errors.push(ValidationError::out_of_range(
            "Pattern",
            "length",
            pattern.length,
            Pattern::MIN_LENGTH,
            Pattern::MAX_LENGTH,
        ));
    }
    if !(Pattern::MIN_RESOLUTION..=Pattern::MAX_RESOLUTION).contains(&pattern.resolution) {
        errors.push(ValidationError::out_of_range(
            "Pattern",
            "resolution",
            pattern.resolution,
            Pattern::MIN_RESOLUTION,
            Pattern::MAX_RESOLUTION,
        ));
    }
    if !(TEMPO_MIN..=TEMPO_MAX).contains(&pattern.tempo) {
        errors.push(ValidationError::out_of_range(
            "Pattern",
            "tempo",
            pattern.tempo,
            TEMPO_MIN,
            TEMPO_MAX,
        ));
    }
    if !pattern.time_signature.is_valid() {
        errors.push(ValidationError::field(
            "Pattern",
            "time_signature",
            format!("{} is invalid", pattern.time_signature),
        ));
    }
    if !(0.0..=1.0).contains(&pattern.swing) {
        errors.push(ValidationError::out_of_range(
            "Pattern",
            "swing",
            pattern.swing,
            0.0,
            1.0,
        ));
    }
    check_unit("Pattern", "shuffle", pattern.shuffle, &mut errors);
    check_dates("Pattern", pattern.created_at, pattern.updated_at, &mut errors);

    if !state.projects.contains_key(&pattern.project) {
        errors.push(ValidationError::dangling_link(
            "Pattern",
            "project",
            pattern.project,
        ));
    }
    if let Some(kit) = pattern.kit {
        if !state.kits.contains_key(&kit) {
            errors.push(ValidationError::dangling_link("Pattern", "kit", kit));
        }
    }

    let tracks = state.tracks_of_pattern(pattern.id);
    if tracks.len() > Kit::TRACK_SLOTS {
        errors.push(ValidationError::count_exceeded(
            "Pattern",
            "tracks",
            tracks.len(),
            Kit::TRACK_SLOTS,
        ));
    }
    for window in tracks.windows(2) {
        if window[0].slot == window[1].slot {
            errors.push(ValidationError::Relationship {
                entity: "Pattern",
                relationship: "tracks",
                message: format!("duplicate track slot {}", window[0].slot),
            });
        }
    }

    // The trig grid must stay complete: one trig per track per step
    let expected = tracks.len() * pattern.length as usize;
    let actual = state.trig_count(pattern.id);
    if actual != expected {
        errors.push(ValidationError::Capacity {
            entity: "Pattern",
            relationship: "trigs",
            expected,
            actual,
        });
    }

    errors
}

pub(super) fn kit_errors(state: &StoreState, kit: &Kit) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    check_name("Kit", &kit.name, &mut errors);
    check_unit("Kit", "delay_level", kit.delay_level, &mut errors);
    check_unit("Kit", "reverb_level", kit.reverb_level, &mut errors);
    check_unit("Kit", "compressor_level", kit.compressor_level, &mut errors);
    check_dates("Kit", kit.created_at, kit.updated_at, &mut errors);

    let tracks = state.tracks_of_kit(kit.id);
    if tracks.len() != Kit::TRACK_SLOTS {
        errors.push(ValidationError::Capacity {
            entity: "Kit",
            relationship: "tracks",
            expected: Kit::TRACK_SLOTS,
            actual: tracks.len(),
        });
    }
    for window in tracks.windows(2) {
        if window[0].slot == window[1].slot {
            errors.push(ValidationError::Relationship {
                entity: "Kit",
                relationship: "tracks",
                message: format!("duplicate track slot {}", window[0].slot),
            });
        }
    }

    let fx = state.fx_of_kit(kit.id).len();
    if fx != 1 {
        errors.push(ValidationError::Capacity {
            entity: "Kit",
            relationship: "fx_settings",
            expected: 1,
            actual: fx,
        });
    }

    for preset in &kit.presets {
        if !state.presets.contains_key(preset) {
            errors.push(ValidationError::dangling_link("Kit", "presets", preset));
        }
    }

    errors
}

pub(super) fn track_errors(state: &StoreState, track: &Track) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    check_name("Track", &track.name, &mut errors);
    check_unit("Track", "volume", track.volume, &mut errors);
    if !(-1.0..=1.0).contains(&track.pan) {
        errors.push(ValidationError::out_of_range(
            "Track", "pan", track.pan, -1.0, 1.0,
        ));
    }
    if !track.slot_in_range() {
        errors.push(ValidationError::out_of_range(
            "Track",
            "slot",
            track.slot as usize,
            0,
            Kit::TRACK_SLOTS - 1,
        ));
    }
    check_dates("Track", track.created_at, track.updated_at, &mut errors);

    let pattern = state.patterns.get(&track.pattern);
    if pattern.is_none() {
        errors.push(ValidationError::dangling_link(
            "Track",
            "pattern",
            track.pattern,
        ));
    }
    if !state.kits.contains_key(&track.kit) {
        errors.push(ValidationError::dangling_link("Track", "kit", track.kit));
    }
    if let Some(preset) = track.preset {
        if !state.presets.contains_key(&preset) {
            errors.push(ValidationError::dangling_link("Track", "preset", preset));
        }
    }

    if let Some(pattern) = pattern {
        let trigs = state.trigs_of_track(track.id);
        if trigs.len() != pattern.length as usize {
            errors.push(ValidationError::Capacity {
                entity: "Track",
                relationship: "trigs",
                expected: pattern.length as usize,
                actual: trigs.len(),
            });
        }
        for window in trigs.windows(2) {
            if window[0].step == window[1].step {
                errors.push(ValidationError::Relationship {
                    entity: "Track",
                    relationship: "trigs",
                    message: format!("duplicate trig step {}", window[0].step),
                });
            }
        }
    }

    errors
}

pub(super) fn trig_errors(state: &StoreState, trig: &Trig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !(1..=127).contains(&trig.velocity) {
        errors.push(ValidationError::out_of_range(
            "Trig",
            "velocity",
            trig.velocity,
            1,
            127,
        ));
    }
    if trig.note > 127 {
        errors.push(ValidationError::out_of_range(
            "Trig", "note", trig.note, 0, 127,
        ));
    }
    if !(trig.duration > 0.0 && trig.duration <= Trig::MAX_DURATION_STEPS) {
        errors.push(ValidationError::field(
            "Trig",
            "duration",
            format!(
                "value {} out of range (0, {}]",
                trig.duration,
                Trig::MAX_DURATION_STEPS
            ),
        ));
    }
    check_unit("Trig", "probability", trig.probability, &mut errors);
    if !(-Trig::MAX_MICRO_OFFSET..=Trig::MAX_MICRO_OFFSET).contains(&trig.micro_offset) {
        errors.push(ValidationError::out_of_range(
            "Trig",
            "micro_offset",
            trig.micro_offset,
            -Trig::MAX_MICRO_OFFSET,
            Trig::MAX_MICRO_OFFSET,
        ));
    }
    if !(1..=Trig::MAX_RETRIG_COUNT).contains(&trig.retrig_count) {
        errors.push(ValidationError::out_of_range(
            "Trig",
            "retrig_count",
            trig.retrig_count,
            1,
            Trig::MAX_RETRIG_COUNT,
        ));
    }
    check_dates("Trig", trig.created_at, trig.updated_at, &mut errors);

    if !state.tracks.contains_key(&trig.track) {
        errors.push(ValidationError::dangling_link("Trig", "track", trig.track));
    }
    match state.patterns.get(&trig.pattern) {
        None => errors.push(ValidationError::dangling_link(
            "Trig",
            "pattern",
            trig.pattern,
        )),
        Some(pattern) => {
            if trig.step >= pattern.length {
                errors.push(ValidationError::out_of_range(
                    "Trig",
                    "step",
                    trig.step,
                    0,
                    pattern.length.saturating_sub(1),
                ));
            }
        }
    }

    let locks = state.locks_of_trig(trig.id);
    if locks.len() > ParameterLock::MAX_PER_TRIG {
        errors.push(ValidationError::count_exceeded(
            "Trig",
            "parameter_locks",
            locks.len(),
            ParameterLock::MAX_PER_TRIG,
        ));
    }
    let mut names: Vec<&str> = locks.iter().map(|l| l.parameter.as_str()).collect();
    names.sort_unstable();
    for window in names.windows(2) {
        if window[0] == window[1] {
            errors.push(ValidationError::Relationship {
                entity: "Trig",
                relationship: "parameter_locks",
                message: format!("duplicate lock for parameter \"{}\"", window[0]),
            });
        }
    }

    errors
}

pub(super) fn lock_errors(state: &StoreState, lock: &ParameterLock) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let trimmed = lock.parameter.trim();
    if trimmed.is_empty() {
        errors.push(ValidationError::empty("ParameterLock", "parameter"));
    } else if trimmed.len() > ParameterLock::MAX_PARAMETER_NAME_LEN {
        errors.push(ValidationError::too_long(
            "ParameterLock",
            "parameter",
            trimmed.len(),
            ParameterLock::MAX_PARAMETER_NAME_LEN,
        ));
    }
    check_unit("ParameterLock", "value", lock.value, &mut errors);
    check_dates(
        "ParameterLock",
        lock.created_at,
        lock.updated_at,
        &mut errors,
    );

    match state.trigs.get(&lock.trig) {
        None => errors.push(ValidationError::dangling_link(
            "ParameterLock",
            "trig",
            lock.trig,
        )),
        Some(trig) => {
            if lock.step != trig.step {
                errors.push(ValidationError::field(
                    "ParameterLock",
                    "step",
                    format!("step {} does not mirror owning trig step {}", lock.step, trig.step),
                ));
            }
        }
    }

    errors
}

pub(super) fn machine_errors(machine: &Machine) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if let Err(err) = machine.validate() {
        errors.push(err);
    }
    check_dates("Machine", machine.created_at, machine.updated_at, &mut errors);
    errors
}

pub(super) fn preset_errors(state: &StoreState, preset: &Preset) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    check_name("Preset", &preset.name, &mut errors);
    if let Err(err) = preset.params.check_size("Preset") {
        errors.push(err);
    }
    check_dates("Preset", preset.created_at, preset.updated_at, &mut errors);

    match state.machines.get(&preset.machine) {
        None => errors.push(ValidationError::dangling_link(
            "Preset",
            "machine",
            preset.machine,
        )),
        Some(machine) => {
            if machine.kind != preset.kind {
                errors.push(ValidationError::Relationship {
                    entity: "Preset",
                    relationship: "machine",
                    message: format!(
                        "machine kind {} does not match preset kind {}",
                        machine.kind, preset.kind
                    ),
                });
            }
        }
    }
    if let Some(pool) = preset.pool {
        if !state.preset_pools.contains_key(&pool) {
            errors.push(ValidationError::dangling_link("Preset", "pool", pool));
        }
    }

    errors
}

pub(super) fn pool_errors(state: &StoreState, pool: &PresetPool) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_dates("PresetPool", pool.created_at, pool.updated_at, &mut errors);
    if !state.projects.contains_key(&pool.project) {
        errors.push(ValidationError::dangling_link(
            "PresetPool",
            "project",
            pool.project,
        ));
    }
    errors
}

pub(super) fn mixer_errors(state: &StoreState, mixer: &MixerSettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_unit("MixerSettings", "master_volume", mixer.master_volume, &mut errors);
    check_unit("MixerSettings", "cue_volume", mixer.cue_volume, &mut errors);
    for level in mixer.levels {
        if !(0.0..=1.0).contains(&level) {
            errors.push(ValidationError::out_of_range(
                "MixerSettings",
                "levels",
                level,
                0.0,
                1.0,
            ));
        }
    }
    check_dates("MixerSettings", mixer.created_at, mixer.updated_at, &mut errors);
    if !state.projects.contains_key(&mixer.project) {
        errors.push(ValidationError::dangling_link(
            "MixerSettings",
            "project",
            mixer.project,
        ));
    }
    errors
}

pub(super) fn fx_errors(state: &StoreState, fx: &FxSettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_unit("FxSettings", "delay_time", fx.delay_time, &mut errors);
    check_unit("FxSettings", "delay_feedback", fx.delay_feedback, &mut errors);
    check_unit("FxSettings", "reverb_size", fx.reverb_size, &mut errors);
    check_unit("FxSettings", "reverb_damping", fx.reverb_damping, &mut errors);
    check_dates("FxSettings", fx.created_at, fx.updated_at, &mut errors);
    if !state.kits.contains_key(&fx.kit) {
        errors.push(ValidationError::dangling_link("FxSettings", "kit", fx.kit));
    }
    errors
}
