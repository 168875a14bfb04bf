// Pattern: a fixed-length step sequence with its own tempo, time signature
// and groove settings. Owns its tracks and trigs; the kit reference is
// shared across patterns (nullify on kit delete).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::id::{KitId, PatternId, ProjectId};
use crate::entity::{MAX_NAME_LEN, TEMPO_MAX, TEMPO_MIN, now};
use crate::validation::ValidationError;

/// Time signature (numerator/denominator)
/// Example: 4/4 time = TimeSignature { numerator: 4, denominator: 4 }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,   // Beats per bar (typically 3, 4, 5, 6, 7)
    pub denominator: u8, // Note value (4 = quarter note, 8 = eighth note)
}

impl TimeSignature {
    pub fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self::new(4, 4)
    }

    /// Common 3/4 time signature (waltz)
    pub fn three_four() -> Self {
        Self::new(3, 4)
    }

    pub fn is_valid(&self) -> bool {
        (1..=32).contains(&self.numerator)
            && self.denominator.is_power_of_two()
            && self.denominator <= 32
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Musical scale applied to the pattern's pitch grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    Chromatic,
    Major,
    Minor,
    Dorian,
    Mixolydian,
    PentatonicMajor,
    PentatonicMinor,
}

/// Root key for the pattern's scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: PatternId,
    pub project: ProjectId,
    /// Shared kit assignment; survives pattern deletion and vice versa
    pub kit: Option<KitId>,
    pub name: String,
    /// Step count (1 - 128). Changed only through the lifecycle manager so
    /// the trig grid stays consistent.
    pub length: u32,
    /// Steps per bar figure used by the timing formulas (1 - 64)
    pub resolution: u32,
    pub tempo: f64,
    pub time_signature: TimeSignature,
    /// Off-beat swing amount (0.0 - 1.0); f64 because it feeds the f64
    /// timing math directly
    pub swing: f64,
    /// Shuffle amount (0.0 - 1.0)
    pub shuffle: f32,
    pub scale: Scale,
    pub key: Key,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pattern {
    pub const MIN_LENGTH: u32 = 1;
    pub const MAX_LENGTH: u32 = 128;
    pub const DEFAULT_LENGTH: u32 = 16;
    pub const MIN_RESOLUTION: u32 = 1;
    pub const MAX_RESOLUTION: u32 = 64;

    pub fn new(project: ProjectId, name: impl Into<String>, tempo: f64) -> Self {
        let stamp = now();
        Self {
            id: PatternId::new(),
            project,
            kit: None,
            name: name.into(),
            length: Self::DEFAULT_LENGTH,
            resolution: 16,
            tempo,
            time_signature: TimeSignature::four_four(),
            swing: 0.0,
            shuffle: 0.0,
            scale: Scale::Chromatic,
            key: Key::C,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty("Pattern", "name"));
        }
        if trimmed.len() > MAX_NAME_LEN {
            return Err(ValidationError::too_long(
                "Pattern",
                "name",
                trimmed.len(),
                MAX_NAME_LEN,
            ));
        }
        self.name = name;
        self.touch();
        Ok(())
    }

    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), ValidationError> {
        if !(TEMPO_MIN..=TEMPO_MAX).contains(&bpm) {
            return Err(ValidationError::out_of_range(
                "Pattern", "tempo", bpm, TEMPO_MIN, TEMPO_MAX,
            ));
        }
        self.tempo = bpm;
        self.touch();
        Ok(())
    }

    pub fn set_time_signature(&mut self, signature: TimeSignature) -> Result<(), ValidationError> {
        if !signature.is_valid() {
            return Err(ValidationError::field(
                "Pattern",
                "time_signature",
                format!(
                    "{signature} is invalid (numerator 1-32, denominator a power of two <= 32)"
                ),
            ));
        }
        self.time_signature = signature;
        self.touch();
        Ok(())
    }

    pub fn set_swing(&mut self, swing: f64) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&swing) {
            return Err(ValidationError::out_of_range(
                "Pattern", "swing", swing, 0.0, 1.0,
            ));
        }
        self.swing = swing;
        self.touch();
        Ok(())
    }

    pub fn set_shuffle(&mut self, shuffle: f32) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&shuffle) {
            return Err(ValidationError::out_of_range(
                "Pattern", "shuffle", shuffle, 0.0, 1.0,
            ));
        }
        self.shuffle = shuffle;
        self.touch();
        Ok(())
    }

    pub fn set_scale(&mut self, scale: Scale, key: Key) {
        self.scale = scale;
        self.key = key;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}
