//! Primitive Invocation Adapter
//!
//! Wraps a primitive so that it can be called with caller-supplied buffer
//! handles. Each invocation runs the same sequence:
//!
//! ```text
//! resolve every parameter in signature order
//!   └─ environment error ──► release what was resolved, return Err
//! call the primitive with the resolved frame
//! release outputs (commit), then inputs (discard)
//! return the primitive's status unchanged
//! ```
//!
//! Release is owned by [`CallContext`]. It runs on every exit path,
//! including an unwinding panic inside the primitive.

mod frame;


use tracing::{debug, error};

use crate::config::{AbsentPolicy, BridgeConfig};
use crate::error::{BridgeError, BridgeResult};
use crate::managed::ManagedRuntime;
use crate::resolver::{BufferResolver, BufferView};
use crate::status;

pub use frame::{Arg, Frame};

/// How a primitive uses a buffer parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Read only, must be supplied
    Input,
    /// Read only, may be absent
    Optional,
    /// Written by the primitive
    Output,
}

impl Role {
    pub fn is_output(self) -> bool {
        matches!(self, Role::Output)
    }

    pub fn is_required(self) -> bool {
        !matches!(self, Role::Optional)
    }
}

/// A named buffer parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub role: Role,
}

impl Param {
    pub const fn input(name: &'static str) -> Self {
        Self {
            name,
            role: Role::Input,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            role: Role::Optional,
        }
    }

    pub const fn output(name: &'static str) -> Self {
        Self {
            name,
            role: Role::Output,
        }
    }
}

/// Buffer and scalar parameters of a primitive
#[derive(Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: &'static str,
    pub params: &'static [Param],
    pub scalars: &'static [&'static str],
}

impl Signature {
    /// Number of buffer parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Position of the buffer parameter called `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        let mut first = true;
        for param in self.params {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            let role = match param.role {
                Role::Input => "in",
                Role::Optional => "in?",
                Role::Output => "out",
            };
            write!(f, "{} {}", role, param.name)?;
        }
        for scalar in self.scalars {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}", scalar)?;
        }
        write!(f, ")")
    }
}

/// Resolved buffers of one invocation.
///
/// Dropping the context releases every view: outputs first, then inputs,
/// each group in resolution order.
pub struct CallContext<'r, R: ManagedRuntime> {
    resolver: BufferResolver<'r, R>,
    slots: Vec<(Role, BufferView<R::Array>)>,
}

impl<'r, R: ManagedRuntime> CallContext<'r, R> {
    /// Resolve `handles` against `signature` in order.
    ///
    /// On failure, views resolved so far are released before the error is
    /// returned.
    pub fn acquire(
        runtime: &'r R,
        signature: &Signature,
        handles: &[Option<&R::Buffer>],
    ) -> BridgeResult<Self> {
        if handles.len() != signature.arity() {
            return Err(BridgeError::InvalidArgCount {
                primitive: signature.name,
                expected: signature.arity(),
                got: handles.len(),
            });
        }

        let mut ctx = Self {
            resolver: BufferResolver::new(runtime),
            slots: Vec::with_capacity(handles.len()),
        };
        for (param, handle) in signature.params.iter().zip(handles) {
            let view = ctx.resolver.resolve(*handle)?;
            ctx.slots.push((param.role, view));
        }
        Ok(ctx)
    }

    /// The frame the primitive runs against
    pub fn frame(&self) -> Frame<'_> {
        Frame::new(
            self.slots
                .iter()
                .map(|(role, view)| Arg::new(view.data_ptr(), view.len(), *role))
                .collect(),
        )
    }

    /// Index of the first required parameter that was not supplied
    pub fn first_absent_required(&self) -> Option<usize> {
        self.slots
            .iter()
            .position(|(role, view)| role.is_required() && view.is_absent())
    }

    /// Views in resolution order
    pub fn views(&self) -> impl Iterator<Item = (Role, &BufferView<R::Array>)> + '_ {
        self.slots.iter().map(|(role, view)| (*role, view))
    }

    /// Release everything now
    pub fn finish(mut self) {
        self.release_all();
    }

    fn release_all(&mut self) {
        let (outputs, inputs): (Vec<_>, Vec<_>) = std::mem::take(&mut self.slots)
            .into_iter()
            .partition(|(role, _)| role.is_output());

        for (_, view) in outputs {
            self.resolver.release_as_output(view);
        }
        for (_, view) in inputs {
            self.resolver.release_as_input(view);
        }
    }
}

impl<R: ManagedRuntime> Drop for CallContext<'_, R> {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Runs primitives against caller-supplied buffers
pub struct Invoker<'r, R: ManagedRuntime> {
    runtime: &'r R,
    absent: AbsentPolicy,
    trace_calls: bool,
}

impl<'r, R: ManagedRuntime> Invoker<'r, R> {
    pub fn new(runtime: &'r R) -> Self {
        Self {
            runtime,
            absent: AbsentPolicy::default(),
            trace_calls: false,
        }
    }

    /// Invoker using the policy and tracing settings of `config`
    pub fn configured(runtime: &'r R, config: &BridgeConfig) -> Self {
        Self::new(runtime)
            .with_absent_policy(config.bridge.absent_buffers)
            .with_call_tracing(config.bridge.trace_calls)
    }

    pub fn with_absent_policy(mut self, policy: AbsentPolicy) -> Self {
        self.absent = policy;
        self
    }

    pub fn with_call_tracing(mut self, enabled: bool) -> Self {
        self.trace_calls = enabled;
        self
    }

    pub fn runtime(&self) -> &'r R {
        self.runtime
    }

    pub fn absent_policy(&self) -> AbsentPolicy {
        self.absent
    }

    /// Resolve `handles`, run `call` against them and release everything.
    ///
    /// The status returned by `call` is passed through untouched. `Err` means
    /// the environment failed and `call` never ran.
    pub fn invoke<F>(
        &self,
        signature: &Signature,
        handles: &[Option<&R::Buffer>],
        call: F,
    ) -> BridgeResult<i32>
    where
        F: FnOnce(&Frame<'_>) -> i32,
    {
        let ctx = match CallContext::acquire(self.runtime, signature, handles) {
            Ok(ctx) => ctx,
            Err(err) => {
                error!(primitive = signature.name, %err, "buffer resolution failed");
                return Err(err);
            }
        };

        if self.absent == AbsentPolicy::Reject {
            if let Some(index) = ctx.first_absent_required() {
                debug!(
                    primitive = signature.name,
                    param = signature.params[index].name,
                    "required buffer absent"
                );
                ctx.finish();
                return Ok(status::ABSENT_REQUIRED);
            }
        }

        let status = call(&ctx.frame());
        ctx.finish();

        if self.trace_calls {
            debug!(primitive = signature.name, status, "primitive returned");
        }
        Ok(status)
    }
}
