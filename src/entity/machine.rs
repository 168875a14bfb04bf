// Machine: polymorphic sound-processing unit (voice/filter/fx) with an
// opaque parameter map. Modeled as a tagged variant plus a capability
// trait rather than a class hierarchy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::id::MachineId;
use crate::entity::now;
use crate::entity::params::ParamMap;
use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineKind {
    Voice,
    Filter,
    Fx,
}

impl MachineKind {
    /// Closed set of valid type names per kind
    pub fn type_names(&self) -> &'static [&'static str] {
        match self {
            Self::Voice => &["analog", "fm", "wavetable", "sample"],
            Self::Filter => &["lowpass", "highpass", "bandpass", "comb"],
            Self::Fx => &["delay", "reverb", "chorus", "bitcrush"],
        }
    }

    pub fn allowed(&self) -> &'static str {
        match self {
            Self::Voice => "{analog, fm, wavetable, sample}",
            Self::Filter => "{lowpass, highpass, bandpass, comb}",
            Self::Fx => "{delay, reverb, chorus, bitcrush}",
        }
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voice => write!(f, "voice"),
            Self::Filter => write!(f, "filter"),
            Self::Fx => write!(f, "fx"),
        }
    }
}

/// Shared capability surface over every machine variant.
pub trait MachineCapability {
    fn validate(&self) -> Result<(), ValidationError>;
    fn parameter_map(&self) -> &ParamMap;
    fn export_metadata(&self) -> MachineMetadata;
}

/// Display-ready machine summary for external consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineMetadata {
    pub kind: MachineKind,
    pub type_name: String,
    pub enabled: bool,
    pub bypass: bool,
    pub parameter_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub kind: MachineKind,
    /// One of the kind's closed type-name set
    pub type_name: String,
    pub enabled: bool,
    pub bypass: bool,
    pub params: ParamMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Machine {
    pub fn new(kind: MachineKind, type_name: impl Into<String>) -> Self {
        let stamp = now();
        Self {
            id: MachineId::new(),
            kind,
            type_name: type_name.into(),
            enabled: true,
            bypass: false,
            params: ParamMap::new(),
            created_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn set_type_name(&mut self, type_name: impl Into<String>) -> Result<(), ValidationError> {
        let type_name = type_name.into();
        if !self.kind.type_names().contains(&type_name.as_str()) {
            return Err(ValidationError::Enumeration {
                entity: "Machine",
                field: "type_name",
                value: type_name,
                allowed: self.kind.allowed(),
            });
        }
        self.type_name = type_name;
        self.touch();
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.touch();
    }

    pub fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
        self.touch();
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: f64) {
        self.params.set(key, value);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

impl MachineCapability for Machine {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.kind.type_names().contains(&self.type_name.as_str()) {
            return Err(ValidationError::Enumeration {
                entity: "Machine",
                field: "type_name",
                value: self.type_name.clone(),
                allowed: self.kind.allowed(),
            });
        }
        self.params.check_size("Machine")
    }

    fn parameter_map(&self) -> &ParamMap {
        &self.params
    }

    fn export_metadata(&self) -> MachineMetadata {
        MachineMetadata {
            kind: self.kind,
            type_name: self.type_name.clone(),
            enabled: self.enabled,
            bypass: self.bypass,
            parameter_count: self.params.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_defaults() {
        let machine = Machine::new(MachineKind::Voice, "analog");
        assert!(machine.enabled);
        assert!(!machine.bypass);
        assert!(machine.params.is_empty());
        assert!(machine.validate().is_ok());
    }

    #[test]
    fn test_type_name_membership_per_kind() {
        let mut machine = Machine::new(MachineKind::Filter, "lowpass");
        assert!(machine.set_type_name("comb").is_ok());

        // "analog" is a voice name, not a filter name
        let err = machine.set_type_name("analog").unwrap_err();
        assert!(err.to_string().contains("type_name"));
        assert_eq!(machine.type_name, "comb");
    }

    #[test]
    fn test_validate_catches_bad_type_name() {
        let machine = Machine::new(MachineKind::Fx, "granular");
        assert!(machine.validate().is_err());
    }

    #[test]
    fn test_export_metadata() {
        let mut machine = Machine::new(MachineKind::Fx, "delay");
        machine.set_param("time", 0.25);
        machine.set_param("feedback", 0.5);

        let meta = machine.export_metadata();
        assert_eq!(meta.kind, MachineKind::Fx);
        assert_eq!(meta.type_name, "delay");
        assert_eq!(meta.parameter_count, 2);
    }
}
