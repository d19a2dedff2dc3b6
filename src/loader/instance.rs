//! Capability views over shared backend objects.
//!
//! An `Instance` is one reference to an object, viewed through one
//! interface. Every view of the same object shares a single reference
//! count: cloning or querying adds a reference, dropping releases one, and
//! the object is destroyed when the last view goes away.

use std::sync::Arc;

use crate::core::{
    Backend, CapabilitySet, Compiler, Compiler3, Interface, Validator, Validator2, VersionInfo,
};
use crate::loader::errors::{ExtValError, ExtValResult};

#[derive(Clone)]
pub struct Instance {
    object: Arc<dyn Backend>,
    interface: Interface,
}

impl Instance {
    /// View `object` through `interface`.
    ///
    /// Every object answers `Interface::Unknown`.
    pub fn new(object: Arc<dyn Backend>, interface: Interface) -> ExtValResult<Self> {
        if interface != Interface::Unknown && !object.interfaces().contains(&interface) {
            return Err(ExtValError::NotSupported { interface });
        }
        Ok(Instance { object, interface })
    }

    /// Interface this view was obtained for.
    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    /// All interfaces the underlying object answers.
    pub fn interfaces(&self) -> CapabilitySet {
        self.object.interfaces()
    }

    pub fn supports(&self, interface: &Interface) -> bool {
        *interface == Interface::Unknown || self.object.interfaces().contains(interface)
    }

    /// Obtain another view of the same object.
    pub fn query(&self, interface: Interface) -> ExtValResult<Instance> {
        Instance::new(Arc::clone(&self.object), interface)
    }

    /// Number of live views of the underlying object.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.object)
    }

    /// Whether both views refer to the same object.
    pub fn is_same_object(&self, other: &Instance) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.object), Arc::as_ptr(&other.object))
    }

    pub fn compiler(&self) -> ExtValResult<&dyn Compiler> {
        self.object.as_compiler().ok_or(ExtValError::NotSupported {
            interface: Interface::Compiler,
        })
    }

    pub fn compiler3(&self) -> ExtValResult<&dyn Compiler3> {
        self.object.as_compiler3().ok_or(ExtValError::NotSupported {
            interface: Interface::Compiler3,
        })
    }

    pub fn validator(&self) -> ExtValResult<&dyn Validator> {
        self.object.as_validator().ok_or(ExtValError::NotSupported {
            interface: Interface::Validator,
        })
    }

    pub fn validator2(&self) -> ExtValResult<&dyn Validator2> {
        self.object.as_validator2().ok_or(ExtValError::NotSupported {
            interface: Interface::Validator2,
        })
    }

    pub fn version_info(&self) -> ExtValResult<&dyn VersionInfo> {
        self.object.as_version_info().ok_or(ExtValError::NotSupported {
            interface: Interface::VersionInfo,
        })
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("interface", &self.interface)
            .field("ref_count", &self.ref_count())
            .finish()
    }
}
