//! Class and interface identifiers.
//!
//! A `ClassId` names what kind of object a module should instantiate. An
//! `Interface` names one capability an instantiated object may answer.
//! Both sets are open-ended: anything outside the well-known values is
//! carried as `Other(name)`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identifier for a class of object a module can create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassId {
    /// The shader compiler
    Compiler,
    /// The container validator
    Validator,
    /// Blob/encoding helpers
    Utils,
    /// Legacy blob library
    Library,
    /// Container reflection
    ContainerReflection,
    /// Any class not listed above
    Other(String),
}

impl ClassId {
    /// Get the class name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            ClassId::Compiler => "compiler",
            ClassId::Validator => "validator",
            ClassId::Utils => "utils",
            ClassId::Library => "library",
            ClassId::ContainerReflection => "container_reflection",
            ClassId::Other(name) => name,
        }
    }
}

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ClassId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "compiler" => ClassId::Compiler,
            "validator" => ClassId::Validator,
            "utils" => ClassId::Utils,
            "library" => ClassId::Library,
            "container_reflection" => ClassId::ContainerReflection,
            _ => ClassId::Other(s.to_string()),
        })
    }
}

/// Identifier for a capability interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interface {
    /// Object identity and lifetime. Every object answers it.
    Unknown,
    /// Classic compiler API
    Compiler,
    /// Modern compiler API
    Compiler3,
    /// Basic validation
    Validator,
    /// Validation with debug bitcode
    Validator2,
    /// Module version query
    VersionInfo,
    /// Any interface not listed above
    Other(String),
}

impl Interface {
    /// Get the interface name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Interface::Unknown => "unknown",
            Interface::Compiler => "compiler",
            Interface::Compiler3 => "compiler3",
            Interface::Validator => "validator",
            Interface::Validator2 => "validator2",
            Interface::VersionInfo => "version_info",
            Interface::Other(name) => name,
        }
    }

    /// Whether calls through this interface compile source and so run the
    /// compiler's internal validation.
    pub fn is_compile(&self) -> bool {
        matches!(self, Interface::Compiler | Interface::Compiler3)
    }
}

impl std::fmt::Display for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The set of interfaces one object answers.
///
/// Ordered so that listings and logs are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    interfaces: BTreeSet<Interface>,
}

impl CapabilitySet {
    /// Create an empty set.
    pub fn new() -> Self {
        CapabilitySet::default()
    }

    /// Build a set from a list of interfaces.
    pub fn from_interfaces(interfaces: &[Interface]) -> Self {
        CapabilitySet {
            interfaces: interfaces.iter().cloned().collect(),
        }
    }

    /// Add an interface.
    pub fn insert(&mut self, interface: Interface) {
        self.interfaces.insert(interface);
    }

    /// Check membership.
    pub fn contains(&self, interface: &Interface) -> bool {
        self.interfaces.contains(interface)
    }

    /// Union of two sets.
    pub fn union(&self, other: &CapabilitySet) -> CapabilitySet {
        CapabilitySet {
            interfaces: self.interfaces.union(&other.interfaces).cloned().collect(),
        }
    }

    /// Iterate in stable order.
    pub fn iter(&self) -> impl Iterator<Item = &Interface> + '_ {
        self.interfaces.iter()
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}

impl FromIterator<Interface> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Interface>>(iter: T) -> Self {
        CapabilitySet {
            interfaces: iter.into_iter().collect(),
        }
    }
}
