// Trig: a single step-slot event, plus its per-step parameter locks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::id::{ParameterLockId, PatternId, TrackId, TrigId};
use crate::entity::now;
use crate::validation::ValidationError;

/// Retrigger rate as a step subdivision. The valid set is closed; raw
/// numeric input goes through [`RetrigRate::from_subdivision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrigRate {
    Fourth,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
}

impl RetrigRate {
    pub const ALLOWED: &'static str = "{4, 8, 16, 32, 64}";

    pub fn subdivision(&self) -> u32 {
        match self {
            Self::Fourth => 4,
            Self::Eighth => 8,
            Self::Sixteenth => 16,
            Self::ThirtySecond => 32,
            Self::SixtyFourth => 64,
        }
    }

    pub fn from_subdivision(value: u32) -> Result<Self, ValidationError> {
        match value {
            4 => Ok(Self::Fourth),
            8 => Ok(Self::Eighth),
            16 => Ok(Self::Sixteenth),
            32 => Ok(Self::ThirtySecond),
            64 => Ok(Self::SixtyFourth),
            other => Err(ValidationError::Enumeration {
                entity: "Trig",
                field: "retrig_rate",
                value: other.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

impl Default for RetrigRate {
    fn default() -> Self {
        Self::Sixteenth
    }
}

impl fmt::Display for RetrigRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{}", self.subdivision())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trig {
    pub id: TrigId,
    pub track: TrackId,
    pub pattern: PatternId,
    /// Step index within the pattern grid (0-based)
    pub step: u32,
    pub active: bool,
    /// MIDI-style velocity (1 - 127)
    pub velocity: u8,
    /// MIDI note number (0 - 127)
    pub note: u8,
    /// Gate length in steps (0 < duration <= 64)
    pub duration: f32,
    /// Chance this trig fires on a given playback pass (0.0 - 1.0)
    pub probability: f32,
    /// Signed micro-timing offset as a fraction of one step (-0.5 - 0.5)
    pub micro_offset: f32,
    /// Number of sub-triggers within the step (1 - 8)
    pub retrig_count: u8,
    pub retrig_rate: RetrigRate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trig {
    pub const MAX_RETRIG_COUNT: u8 = 8;
    pub const MAX_DURATION_STEPS: f32 = 64.0;
    pub const MAX_MICRO_OFFSET: f32 = 0.5;

    pub fn new(track: TrackId, pattern: PatternId, step: u32) -> Self {
        let stamp = now();
        Self {
            id: TrigId::new(),
            track,
            pattern,
            step,
            active: false,
            velocity: 100,
            note: 60,
            duration: 1.0,
            probability: 1.0,
            micro_offset: 0.0,
            retrig_count: 1,
            retrig_rate: RetrigRate::default(),
            created_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.touch();
    }

    pub fn set_velocity(&mut self, velocity: u8) -> Result<(), ValidationError> {
        if !(1..=127).contains(&velocity) {
            return Err(ValidationError::out_of_range(
                "Trig", "velocity", velocity, 1, 127,
            ));
        }
        self.velocity = velocity;
        self.touch();
        Ok(())
    }

    pub fn set_note(&mut self, note: u8) -> Result<(), ValidationError> {
        if note > 127 {
            return Err(ValidationError::out_of_range("Trig", "note", note, 0, 127));
        }
        self.note = note;
        self.touch();
        Ok(())
    }

    pub fn set_duration(&mut self, duration: f32) -> Result<(), ValidationError> {
        if !(duration > 0.0 && duration <= Self::MAX_DURATION_STEPS) {
            return Err(ValidationError::field(
                "Trig",
                "duration",
                format!(
                    "value {duration} out of range (0, {}]",
                    Self::MAX_DURATION_STEPS
                ),
            ));
        }
        self.duration = duration;
        self.touch();
        Ok(())
    }

    pub fn set_probability(&mut self, probability: f32) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ValidationError::out_of_range(
                "Trig",
                "probability",
                probability,
                0.0,
                1.0,
            ));
        }
        self.probability = probability;
        self.touch();
        Ok(())
    }

    pub fn set_micro_offset(&mut self, offset: f32) -> Result<(), ValidationError> {
        if !(-Self::MAX_MICRO_OFFSET..=Self::MAX_MICRO_OFFSET).contains(&offset) {
            return Err(ValidationError::out_of_range(
                "Trig",
                "micro_offset",
                offset,
                -Self::MAX_MICRO_OFFSET,
                Self::MAX_MICRO_OFFSET,
            ));
        }
        self.micro_offset = offset;
        self.touch();
        Ok(())
    }

    pub fn set_retrig(&mut self, count: u8, rate: RetrigRate) -> Result<(), ValidationError> {
        if !(1..=Self::MAX_RETRIG_COUNT).contains(&count) {
            return Err(ValidationError::out_of_range(
                "Trig",
                "retrig_count",
                count,
                1,
                Self::MAX_RETRIG_COUNT,
            ));
        }
        self.retrig_count = count;
        self.retrig_rate = rate;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

/// Per-step override of one named parameter, scoped to one trig.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterLock {
    pub id: ParameterLockId,
    pub trig: TrigId,
    /// Mirrors the owning trig's step index
    pub step: u32,
    pub parameter: String,
    /// Normalized override value (0.0 - 1.0)
    pub value: f32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParameterLock {
    pub const MAX_PARAMETER_NAME_LEN: usize = 64;
    /// Maximum locks one trig may own
    pub const MAX_PER_TRIG: usize = 64;

    pub fn new(trig: TrigId, step: u32, parameter: impl Into<String>, value: f32) -> Self {
        let stamp = now();
        Self {
            id: ParameterLockId::new(),
            trig,
            step,
            parameter: parameter.into(),
            value,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn set_value(&mut self, value: f32) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::out_of_range(
                "ParameterLock",
                "value",
                value,
                0.0,
                1.0,
            ));
        }
        self.value = value;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trig_defaults() {
        let trig = Trig::new(TrackId::new(), PatternId::new(), 3);
        assert_eq!(trig.step, 3);
        assert!(!trig.active);
        assert_eq!(trig.velocity, 100);
        assert_eq!(trig.note, 60);
        assert_eq!(trig.duration, 1.0);
        assert_eq!(trig.probability, 1.0);
        assert_eq!(trig.micro_offset, 0.0);
        assert_eq!(trig.retrig_count, 1);
        assert_eq!(trig.retrig_rate, RetrigRate::Sixteenth);
    }

    #[test]
    fn test_velocity_excludes_zero() {
        let mut trig = Trig::new(TrackId::new(), PatternId::new(), 0);
        assert!(trig.set_velocity(0).is_err());
        assert!(trig.set_velocity(1).is_ok());
        assert!(trig.set_velocity(127).is_ok());
    }

    #[test]
    fn test_retrig_rate_membership() {
        assert_eq!(
            RetrigRate::from_subdivision(32).unwrap(),
            RetrigRate::ThirtySecond
        );
        let err = RetrigRate::from_subdivision(12).unwrap_err();
        assert!(err.to_string().contains("retrig_rate"));
        assert!(err.to_string().contains("{4, 8, 16, 32, 64}"));
    }

    #[test]
    fn test_retrig_count_bounds() {
        let mut trig = Trig::new(TrackId::new(), PatternId::new(), 0);
        assert!(trig.set_retrig(0, RetrigRate::Eighth).is_err());
        assert!(trig.set_retrig(9, RetrigRate::Eighth).is_err());
        assert!(trig.set_retrig(4, RetrigRate::Eighth).is_ok());
        assert_eq!(trig.retrig_count, 4);
    }

    #[test]
    fn test_micro_offset_bounds() {
        let mut trig = Trig::new(TrackId::new(), PatternId::new(), 0);
        assert!(trig.set_micro_offset(-0.5).is_ok());
        assert!(trig.set_micro_offset(0.51).is_err());
        assert_eq!(trig.micro_offset, -0.5);
    }

    #[test]
    fn test_parameter_lock_value_bounds() {
        let mut lock = ParameterLock::new(TrigId::new(), 2, "cutoff", 0.5);
        assert!(lock.set_value(0.9).is_ok());
        assert!(lock.set_value(-0.1).is_err());
        assert_eq!(lock.value, 0.9);
    }
}
