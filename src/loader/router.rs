//! Composition of the default compiler with an external validator.
//!
//! `ExternalValidationRouter` owns two backends and answers the union of
//! their interfaces. Each request goes to the first backend, primary
//! before secondary, whose cached interface set contains it. Compile calls
//! routed to the primary get `-Vd` appended so the compiler skips its own
//! validation and the external validator stays the only one that runs.
//!
//! ```text
//!                  ┌──────────────────────────┐
//!   Instance ────▶ │ ExternalValidationRouter │ ── Unknown: answered here
//!                  └────────────┬─────────────┘
//!                  ┌────────────┴─────────────┐
//!                  ▼                          ▼
//!          primary (compiler)        secondary (validator)
//!          compile: args + "-Vd"     validate: verbatim
//! ```

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, trace};

use crate::core::{
    Backend, CapabilitySet, Compile3Request, CompileRequest, Compiler, Compiler3, Interface,
    OperationResult, PreprocessRequest, Validator, Validator2, ValidatorFlags, VersionInfo,
};
use crate::loader::args::add_disable_validation_arg;
use crate::loader::errors::{ExtValError, ExtValResult};
use crate::loader::handle::{BackendHandle, Role};
use crate::loader::instance::Instance;

pub struct ExternalValidationRouter {
    // Fields drop in declaration order: the validator is released before
    // the compiler.
    secondary: BackendHandle,
    primary: BackendHandle,
    interfaces: CapabilitySet,
}

impl ExternalValidationRouter {
    /// Compose two backends. Both must already be constructed.
    pub fn new(primary: BackendHandle, secondary: BackendHandle) -> Self {
        debug_assert_eq!(primary.role(), Role::Primary);
        debug_assert_eq!(secondary.role(), Role::Secondary);

        let mut interfaces = primary.interfaces().union(secondary.interfaces());
        interfaces.insert(Interface::Unknown);

        ExternalValidationRouter {
            secondary,
            primary,
            interfaces,
        }
    }

    /// Hand the router over to shared ownership and return its view of
    /// `interface`. The router is dropped if it cannot answer.
    pub fn into_instance(self, interface: Interface) -> ExtValResult<Instance> {
        let object: Arc<dyn Backend> = Arc::new(self);
        Instance::new(object, interface)
    }

    /// Backend that answers `interface`, primary first.
    pub fn route(&self, interface: &Interface) -> Option<&BackendHandle> {
        [&self.primary, &self.secondary]
            .into_iter()
            .find(|handle| handle.supports(interface))
    }

    fn routed(&self, interface: Interface) -> ExtValResult<&BackendHandle> {
        match self.route(&interface) {
            Some(handle) => {
                trace!("routing {} to {} backend", interface, handle.role());
                Ok(handle)
            }
            None => Err(ExtValError::NotSupported { interface }),
        }
    }

    /// Arguments for a call through `interface` routed to `handle`, when
    /// they differ from the caller's.
    ///
    /// Only compile calls reaching the primary are rewritten.
    fn rewritten_arguments(
        interface: &Interface,
        handle: &BackendHandle,
        arguments: &[String],
    ) -> Option<Vec<String>> {
        (interface.is_compile() && handle.role() == Role::Primary)
            .then(|| add_disable_validation_arg(arguments))
    }

    pub fn primary(&self) -> &BackendHandle {
        &self.primary
    }

    pub fn secondary(&self) -> &BackendHandle {
        &self.secondary
    }
}

impl Drop for ExternalValidationRouter {
    fn drop(&mut self) {
        debug!(
            "tearing down composition of {} and {}",
            self.primary.module(),
            self.secondary.module()
        );
    }
}

impl Backend for ExternalValidationRouter {
    fn interfaces(&self) -> CapabilitySet {
        self.interfaces.clone()
    }

    fn as_compiler(&self) -> Option<&dyn Compiler> {
        self.route(&Interface::Compiler).map(|_| self as &dyn Compiler)
    }

    fn as_compiler3(&self) -> Option<&dyn Compiler3> {
        self.route(&Interface::Compiler3).map(|_| self as &dyn Compiler3)
    }

    fn as_validator(&self) -> Option<&dyn Validator> {
        self.route(&Interface::Validator).map(|_| self as &dyn Validator)
    }

    fn as_validator2(&self) -> Option<&dyn Validator2> {
        self.route(&Interface::Validator2).map(|_| self as &dyn Validator2)
    }

    fn as_version_info(&self) -> Option<&dyn VersionInfo> {
        self.route(&Interface::VersionInfo)
            .map(|_| self as &dyn VersionInfo)
    }
}

impl Compiler for ExternalValidationRouter {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<OperationResult> {
        let handle = self.routed(Interface::Compiler)?;
        let compiler = handle.compiler()?;

        match Self::rewritten_arguments(&Interface::Compiler, handle, request.arguments) {
            Some(arguments) => compiler.compile(&request.with_arguments(&arguments)),
            None => compiler.compile(request),
        }
    }

    fn preprocess(&self, request: &PreprocessRequest<'_>) -> Result<OperationResult> {
        self.routed(Interface::Compiler)?
            .compiler()?
            .preprocess(request)
    }

    fn disassemble(&self, object: &[u8]) -> Result<String> {
        self.routed(Interface::Compiler)?
            .compiler()?
            .disassemble(object)
    }
}

impl Compiler3 for ExternalValidationRouter {
    fn compile(&self, request: &Compile3Request<'_>) -> Result<OperationResult> {
        let handle = self.routed(Interface::Compiler3)?;
        let compiler = handle.compiler3()?;

        match Self::rewritten_arguments(&Interface::Compiler3, handle, request.arguments) {
            Some(arguments) => compiler.compile(&request.with_arguments(&arguments)),
            None => compiler.compile(request),
        }
    }

    fn disassemble(&self, object: &[u8]) -> Result<OperationResult> {
        self.routed(Interface::Compiler3)?
            .compiler3()?
            .disassemble(object)
    }
}

impl Validator for ExternalValidationRouter {
    fn validate(&self, shader: &[u8], flags: ValidatorFlags) -> Result<OperationResult> {
        self.routed(Interface::Validator)?
            .validator()?
            .validate(shader, flags)
    }
}

impl Validator2 for ExternalValidationRouter {
    fn validate_with_debug(
        &self,
        shader: &[u8],
        flags: ValidatorFlags,
        debug_bitcode: Option<&[u8]>,
    ) -> Result<OperationResult> {
        self.routed(Interface::Validator2)?
            .validator2()?
            .validate_with_debug(shader, flags, debug_bitcode)
    }
}

impl VersionInfo for ExternalValidationRouter {
    fn version(&self) -> Result<semver::Version> {
        self.routed(Interface::VersionInfo)?
            .version_info()?
            .version()
    }
}
