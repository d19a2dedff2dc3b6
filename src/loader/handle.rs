//! Owned backend objects with cached capability sets.

use tracing::debug;

use crate::core::{
    Backend, CapabilitySet, Compiler, Compiler3, Interface, Validator, Validator2, VersionInfo,
};
use crate::loader::errors::{ExtValError, ExtValResult};

/// Which side of a composition a backend sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The default compiler module
    Primary,
    /// The substituted validator module
    Secondary,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Secondary => write!(f, "secondary"),
        }
    }
}

/// Sole owner of one instantiated backend object.
///
/// The object's interface set is queried once, here, and every routing
/// decision afterwards is a lookup in that cached set.
pub struct BackendHandle {
    role: Role,
    module: String,
    interfaces: CapabilitySet,
    object: Box<dyn Backend>,
}

impl BackendHandle {
    pub fn new(role: Role, module: impl Into<String>, object: Box<dyn Backend>) -> Self {
        let module = module.into();
        let interfaces = object.interfaces();
        debug!(
            "{} backend from {} answers [{}]",
            role,
            module,
            interfaces
                .iter()
                .map(Interface::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        BackendHandle {
            role,
            module,
            interfaces,
            object,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Module the object came from.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn interfaces(&self) -> &CapabilitySet {
        &self.interfaces
    }

    pub fn supports(&self, interface: &Interface) -> bool {
        self.interfaces.contains(interface)
    }

    pub fn compiler(&self) -> ExtValResult<&dyn Compiler> {
        self.view(Interface::Compiler, self.object.as_compiler())
    }

    pub fn compiler3(&self) -> ExtValResult<&dyn Compiler3> {
        self.view(Interface::Compiler3, self.object.as_compiler3())
    }

    pub fn validator(&self) -> ExtValResult<&dyn Validator> {
        self.view(Interface::Validator, self.object.as_validator())
    }

    pub fn validator2(&self) -> ExtValResult<&dyn Validator2> {
        self.view(Interface::Validator2, self.object.as_validator2())
    }

    pub fn version_info(&self) -> ExtValResult<&dyn VersionInfo> {
        self.view(Interface::VersionInfo, self.object.as_version_info())
    }

    fn view<'a, T: ?Sized>(
        &'a self,
        interface: Interface,
        accessor: Option<&'a T>,
    ) -> ExtValResult<&'a T> {
        match accessor {
            Some(view) if self.supports(&interface) => Ok(view),
            _ => Err(ExtValError::NotSupported { interface }),
        }
    }
}

impl Drop for BackendHandle {
    fn drop(&mut self) {
        debug!("releasing {} backend from {}", self.role, self.module);
    }
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendHandle")
            .field("role", &self.role)
            .field("module", &self.module)
            .field("interfaces", &self.interfaces)
            .finish()
    }
}
