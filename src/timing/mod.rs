// Timing calculator: pure functions from a committed pattern snapshot to
// absolute playback times. Total by design; malformed input is clamped,
// never rejected, because playback must not halt.

use serde::{Deserialize, Serialize};

use crate::entity::{Pattern, PatternId, TrackId, Trig};
use crate::store::StoreState;

/// Timing-relevant view of a pattern, normalized so every derived value
/// is finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternTiming {
    length: u32,
    resolution: u32,
    numerator: u32,
    tempo: f64,
    swing: f64,
}

impl PatternTiming {
    /// Tempo clamp used only here; validation owns the stricter commit
    /// range, this one just keeps the math finite.
    const TEMPO_FLOOR: f64 = 1.0;
    const TEMPO_CEIL: f64 = 999.0;

    pub fn new(length: u32, resolution: u32, numerator: u32, tempo: f64, swing: f64) -> Self {
        Self {
            length: length.max(1),
            resolution: resolution.max(1),
            numerator: numerator.max(1),
            tempo: if tempo.is_finite() {
                tempo.clamp(Self::TEMPO_FLOOR, Self::TEMPO_CEIL)
            } else {
                120.0
            },
            swing: if swing.is_finite() {
                swing.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    pub fn from_pattern(pattern: &Pattern) -> Self {
        Self::new(
            pattern.length,
            pattern.resolution,
            pattern.time_signature.numerator as u32,
            pattern.tempo,
            pattern.swing,
        )
    }

    /// bars = length / (resolution / numerator)
    pub fn bars(&self) -> f64 {
        self.length as f64 / (self.resolution as f64 / self.numerator as f64)
    }

    /// duration = bars * numerator * 60 / tempo
    pub fn duration_seconds(&self) -> f64 {
        self.bars() * self.numerator as f64 * 60.0 / self.tempo
    }

    pub fn step_duration(&self) -> f64 {
        self.duration_seconds() / self.length as f64
    }

    /// Base position of a step, clamped into the grid
    pub fn position(&self, step: u32) -> f64 {
        let step = step.min(self.length - 1);
        (step as f64 / self.length as f64) * self.duration_seconds()
    }

    /// Position with swing applied: odd-indexed (off-beat) steps are
    /// pushed late by swing * 0.1 * step_duration.
    pub fn swung_position(&self, step: u32) -> f64 {
        let base = self.position(step);
        if step % 2 == 1 {
            base + self.swing * 0.1 * self.step_duration()
        } else {
            base
        }
    }

    /// Final position of a trig: swing plus its signed micro-timing
    /// offset (a fraction of one step).
    pub fn trig_position(&self, trig: &Trig) -> f64 {
        let micro = if trig.micro_offset.is_finite() {
            (trig.micro_offset as f64).clamp(-0.5, 0.5)
        } else {
            0.0
        };
        self.swung_position(trig.step) + micro * self.step_duration()
    }

    /// Retrigger expansion: n sub-events from the trig's position, spaced
    /// step_duration / n. A count of 1 (or 0) yields the single event.
    pub fn retrig_times(&self, trig: &Trig) -> Vec<f64> {
        let count = trig.retrig_count.max(1) as u32;
        let base = self.trig_position(trig);
        let spacing = self.step_duration() / count as f64;
        (0..count).map(|i| base + i as f64 * spacing).collect()
    }
}

/// Chance this trig fires on one playback pass. The external scheduler
/// rolls the dice; this core only reports the clamped value.
pub fn effective_trigger_chance(trig: &Trig) -> f32 {
    if trig.probability.is_finite() {
        trig.probability.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// One playback event for the external scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub track: TrackId,
    pub slot: u8,
    pub step: u32,
    /// Which retrigger sub-event this is (0-based)
    pub sub_index: u8,
    /// Absolute time within the pattern, in seconds
    pub time: f64,
    pub note: u8,
    pub velocity: u8,
    pub chance: f32,
}

/// Flatten a committed pattern into time-ordered playback events.
/// Inactive trigs are skipped; muted tracks are dropped, and when any
/// track is soloed only soloed tracks remain. A pattern without its own
/// swing inherits the project's master swing.
pub fn schedule_pattern(state: &StoreState, pattern_id: PatternId) -> Vec<ScheduledEvent> {
    let Some(pattern) = state.patterns.get(&pattern_id) else {
        return Vec::new();
    };
    let swing = if pattern.swing > 0.0 {
        pattern.swing
    } else {
        state
            .projects
            .get(&pattern.project)
            .map(|p| p.master_swing as f64)
            .unwrap_or(0.0)
    };
    let timing = PatternTiming::new(
        pattern.length,
        pattern.resolution,
        pattern.time_signature.numerator as u32,
        pattern.tempo,
        swing,
    );

    let tracks = state.tracks_of_pattern(pattern_id);
    let any_solo = tracks.iter().any(|t| t.soloed);

    let mut events = Vec::new();
    for track in tracks {
        let audible = !track.muted && (!any_solo || track.soloed);
        if !audible {
            continue;
        }
        for trig in state.trigs_of_track(track.id) {
            if !trig.active {
                continue;
            }
            let chance = effective_trigger_chance(trig);
            for (i, time) in timing.retrig_times(trig).into_iter().enumerate() {
                events.push(ScheduledEvent {
                    track: track.id,
                    slot: track.slot,
                    step: trig.step,
                    sub_index: i as u8,
                    time,
                    note: trig.note,
                    velocity: trig.velocity,
                    chance,
                });
            }
        }
    }

    events.sort_by(|a, b| {
        a.time
            .partial_cmp(&b.time)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.slot.cmp(&b.slot))
            .then(a.sub_index.cmp(&b.sub_index))
    });
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{PatternId, ProjectId, TrackId};

    fn sixteen_step_timing() -> PatternTiming {
        // length 16, resolution 16, 4/4, 120 BPM
        PatternTiming::new(16, 16, 4, 120.0, 0.0)
    }

    #[test]
    fn test_duration_formula_literal() {
        let timing = sixteen_step_timing();
        // bars = 16 / (16 / 4) = 4; per bar: 4 * 60 / 120 = 2.0 s
        assert_eq!(timing.bars(), 4.0);
        assert_eq!(timing.duration_seconds(), 8.0);
        assert_eq!(timing.duration_seconds() / timing.bars(), 2.0);
        assert_eq!(timing.step_duration(), 0.5);
    }

    #[test]
    fn test_step_zero_at_origin() {
        let timing = sixteen_step_timing();
        assert_eq!(timing.position(0), 0.0);
        assert_eq!(timing.swung_position(0), 0.0);
    }

    #[test]
    fn test_zero_swing_is_identity() {
        let timing = sixteen_step_timing();
        for step in 0..16 {
            assert_eq!(timing.swung_position(step), timing.position(step));
        }
    }

    #[test]
    fn test_swing_shifts_odd_steps_only() {
        let timing = PatternTiming::new(16, 16, 4, 120.0, 0.2);
        let expected_offset = 0.2 * 0.1 * timing.step_duration();

        assert_eq!(timing.swung_position(8), timing.position(8));
        assert_eq!(
            timing.swung_position(9),
            timing.position(9) + expected_offset
        );
    }

    #[test]
    fn test_micro_offset_applied_as_step_fraction() {
        let timing = sixteen_step_timing();
        let mut trig = Trig::new(TrackId::new(), PatternId::new(), 4);
        trig.micro_offset = 0.25;

        // position(4) = 2.0; 0.25 of a 0.5 s step = 0.125
        assert_eq!(timing.trig_position(&trig), 2.125);
    }

    #[test]
    fn test_retrig_single_event_for_count_one() {
        let timing = sixteen_step_timing();
        let trig = Trig::new(TrackId::new(), PatternId::new(), 0);
        assert_eq!(timing.retrig_times(&trig), vec![0.0]);
    }

    #[test]
    fn test_retrig_expansion_count_and_spacing() {
        let timing = sixteen_step_timing();
        let mut trig = Trig::new(TrackId::new(), PatternId::new(), 0);
        trig.retrig_count = 4;

        let times = timing.retrig_times(&trig);
        assert_eq!(times.len(), 4);
        let spacing = timing.step_duration() / 4.0;
        for pair in times.windows(2) {
            assert!((pair[1] - pair[0] - spacing).abs() < 1e-12);
        }
    }

    #[test]
    fn test_degenerate_inputs_are_clamped_not_fatal() {
        let timing = PatternTiming::new(0, 0, 0, 0.0, 5.0);
        assert!(timing.duration_seconds().is_finite());
        assert!(timing.position(100).is_finite());

        let nan_tempo = PatternTiming::new(16, 16, 4, f64::NAN, 0.0);
        assert!(nan_tempo.duration_seconds().is_finite());
    }

    #[test]
    fn test_out_of_grid_step_clamped() {
        let timing = sixteen_step_timing();
        assert_eq!(timing.position(999), timing.position(15));
    }

    #[test]
    fn test_schedule_respects_mute_and_solo() {
        use crate::store::Store;

        let mut store = Store::new();
        let mut tx = store.begin();
        let project = tx.create_project("Demo");
        let pattern = tx.create_pattern(project, "A").unwrap();
        tx.create_kit(pattern, "Drums").unwrap();

        let tracks: Vec<_> = tx
            .state()
            .tracks_of_pattern(pattern)
            .iter()
            .map(|t| t.id)
            .collect();
        // Activate step 0 on the first three tracks
        for track in &tracks[..3] {
            let trig = tx.state().trigs_of_track(*track)[0].id;
            tx.with_trig(trig, |t| t.set_active(true)).unwrap();
        }
        tx.with_track(tracks[0], |t| t.set_muted(true)).unwrap();
        let snapshot = tx.commit().unwrap();

        let events = schedule_pattern(snapshot.state(), pattern);
        assert_eq!(events.len(), 2); // muted track dropped

        // Solo track 2: only its events survive
        let mut tx = store.begin();
        tx.with_track(tracks[2], |t| t.set_soloed(true)).unwrap();
        let snapshot = tx.commit().unwrap();
        let events = schedule_pattern(snapshot.state(), pattern);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].track, tracks[2]);
    }

    #[test]
    fn test_schedule_falls_back_to_master_swing() {
        use crate::store::Store;

        let mut store = Store::new();
        let mut tx = store.begin();
        let project = tx.create_project("Demo");
        tx.with_project(project, |p| p.set_master_swing(0.5).unwrap())
            .unwrap();
        let pattern = tx.create_pattern(project, "A").unwrap();
        tx.create_kit(pattern, "Drums").unwrap();

        let track = tx.state().tracks_of_pattern(pattern)[0].id;
        let trig = tx.state().trigs_of_track(track)[1].id; // odd step
        tx.with_trig(trig, |t| t.set_active(true)).unwrap();
        let snapshot = tx.commit().unwrap();

        let events = schedule_pattern(snapshot.state(), pattern);
        assert_eq!(events.len(), 1);
        let swung = PatternTiming::new(16, 16, 4, 120.0, 0.5);
        assert_eq!(events[0].time, swung.swung_position(1));

        // A pattern with its own swing is not overridden
        let mut tx = store.begin();
        tx.with_pattern(pattern, |p| p.set_swing(0.2).unwrap())
            .unwrap();
        let snapshot = tx.commit().unwrap();
        let events = schedule_pattern(snapshot.state(), pattern);
        let swung = PatternTiming::new(16, 16, 4, 120.0, 0.2);
        assert_eq!(events[0].time, swung.swung_position(1));
    }

    #[test]
    fn test_schedule_unknown_pattern_is_empty() {
        let state = StoreState::new();
        assert!(schedule_pattern(&state, PatternId::new()).is_empty());
    }

    #[test]
    fn test_effective_trigger_chance_clamps() {
        let mut trig = Trig::new(TrackId::new(), PatternId::new(), 0);
        trig.probability = 1.7;
        assert_eq!(effective_trigger_chance(&trig), 1.0);
        trig.probability = f32::NAN;
        assert_eq!(effective_trigger_chance(&trig), 1.0);
        trig.probability = 0.25;
        assert_eq!(effective_trigger_chance(&trig), 0.25);
    }

    #[test]
    fn test_timing_ignores_project_scope() {
        // from_pattern only reads timing fields
        let pattern = Pattern::new(ProjectId::new(), "A", 120.0);
        let timing = PatternTiming::from_pattern(&pattern);
        assert_eq!(timing.duration_seconds(), 8.0);
    }
}
