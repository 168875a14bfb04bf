//! gridseq — step-sequencer data and timing core.
//!
//! Models musical patterns as a hierarchy of projects, patterns, kits,
//! tracks and trigs, enforces the structural and numeric invariants of
//! that hierarchy at commit time, and converts step positions into
//! absolute playback times (swing, micro-timing, retrigger expansion).
//!
//! Mutation happens through [`store::Transaction`] units of work; readers
//! (UI, playback) only ever see committed [`store::Snapshot`]s.

pub mod entity;
pub mod lifecycle;
pub mod store;
pub mod timing;
pub mod validation;

// Re-export commonly used types for convenience
pub use entity::{
    Key, Kit, Machine, MachineCapability, MachineKind, MachineMetadata, ParamMap, ParameterLock,
    Pattern, Preset, Project, RetrigRate, Scale, TimeSignature, Track, Trig,
};
pub use entity::{
    KitId, MachineId, ParameterLockId, PatternId, PresetId, ProjectId, TrackId, TrigId,
};
pub use store::{DeleteRule, EntityKind, Snapshot, Store, StoreError, StoreState, Transaction};
pub use timing::{PatternTiming, ScheduledEvent, effective_trigger_chance, schedule_pattern};
pub use validation::{Mode, ValidationError, validate, validate_fail_fast};
