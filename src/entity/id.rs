// Typed identifiers for every entity kind in the graph

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier for a [`crate::entity::Project`]
    ProjectId
);
entity_id!(PatternId);
entity_id!(KitId);
entity_id!(TrackId);
entity_id!(TrigId);
entity_id!(ParameterLockId);
entity_id!(PresetId);
entity_id!(MachineId);
entity_id!(PresetPoolId);
entity_id!(MixerSettingsId);
entity_id!(FxSettingsId);
