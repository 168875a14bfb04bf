// Entity graph: typed records and their ownership links
// Structure lives here; rule checking lives in crate::validation and runs
// at commit boundaries only.

pub mod id;
pub mod kit;
pub mod machine;
pub mod params;
pub mod pattern;
pub mod preset;
pub mod project;
pub mod track;
pub mod trig;

pub use id::{
    FxSettingsId, KitId, MachineId, MixerSettingsId, ParameterLockId, PatternId,
    PresetId, PresetPoolId, ProjectId, TrackId, TrigId,
};
pub use kit::{FxSettings, Kit};
pub use machine::{Machine, MachineCapability, MachineKind, MachineMetadata};
pub use params::ParamMap;
pub use pattern::{Key, Pattern, Scale, TimeSignature};
pub use preset::{Preset, PresetPool};
pub use project::{MixerSettings, Project};
pub use track::Track;
pub use trig::{ParameterLock, RetrigRate, Trig};

use chrono::{DateTime, Utc};

/// Maximum length of any entity name, trimmed
pub const MAX_NAME_LEN: usize = 255;

/// Valid tempo range in BPM, inclusive
pub const TEMPO_MIN: f64 = 60.0;
pub const TEMPO_MAX: f64 = 300.0;

/// Current timestamp for created/updated stamps
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}
