//! Capability surfaces: declared tables of named remote operations.
//!
//! A surface replaces runtime reflection over an API interface. Each entry
//! binds an operation name and a positional arity to a plain function that
//! builds the [`PendingRequest`]. Names may repeat across arities; the
//! resolver picks the first entry in declaration order whose name and arity
//! both match, so the order entries are declared in is part of the contract.

use anyhow::{anyhow, Context as _};
use tracing::warn;

use crate::request::PendingRequest;
use crate::types::Value;

/// Builds the pending request for one operation from its resolved arguments.
pub type BuildFn = fn(&Args<'_>) -> anyhow::Result<PendingRequest>;

// ---------------------------------------------------------------------------
// OperationDef
// ---------------------------------------------------------------------------

/// One declared remote operation.
#[derive(Clone, Copy)]
pub struct OperationDef {
    name: &'static str,
    arity: usize,
    build: BuildFn,
}

impl OperationDef {
    #[must_use]
    pub fn new(name: &'static str, arity: usize, build: BuildFn) -> Self {
        Self { name, arity, build }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Invokes the builder. `args.len()` is expected to equal the arity.
    ///
    /// # Errors
    ///
    /// Propagates whatever the builder reports.
    pub fn build(&self, args: &Args<'_>) -> anyhow::Result<PendingRequest> {
        (self.build)(args)
    }
}

impl std::fmt::Debug for OperationDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDef")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// CapabilitySurface
// ---------------------------------------------------------------------------

/// The ordered set of remote operations backing one business-object type.
#[derive(Debug, Clone)]
pub struct CapabilitySurface {
    name: &'static str,
    operations: Vec<OperationDef>,
}

impl CapabilitySurface {
    /// Starts declaring a surface called `name` (used in logs and errors).
    #[must_use]
    pub fn builder(name: &'static str) -> CapabilitySurfaceBuilder {
        CapabilitySurfaceBuilder {
            name,
            operations: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// All operations in declaration order.
    #[must_use]
    pub fn operations(&self) -> &[OperationDef] {
        &self.operations
    }

    /// Declared arities for `name`, in declaration order.
    #[must_use]
    pub fn arities(&self, name: &str) -> Vec<usize> {
        self.operations
            .iter()
            .filter(|op| op.name == name)
            .map(|op| op.arity)
            .collect()
    }

    /// `(name, arity)` pairs declared more than once. Only the first
    /// declaration of each is ever reachable.
    #[must_use]
    pub fn shadowed_signatures(&self) -> Vec<(&'static str, usize)> {
        let mut shadowed = Vec::new();
        for (idx, op) in self.operations.iter().enumerate() {
            let earlier = self.operations[..idx]
                .iter()
                .any(|prev| prev.name == op.name && prev.arity == op.arity);
            if earlier && !shadowed.contains(&(op.name, op.arity)) {
                shadowed.push((op.name, op.arity));
            }
        }
        shadowed
    }
}

/// Builder for [`CapabilitySurface`].
#[derive(Debug)]
pub struct CapabilitySurfaceBuilder {
    name: &'static str,
    operations: Vec<OperationDef>,
}

impl CapabilitySurfaceBuilder {
    /// Declares an operation. Call order is declaration order.
    #[must_use]
    pub fn operation(mut self, name: &'static str, arity: usize, build: BuildFn) -> Self {
        self.operations.push(OperationDef::new(name, arity, build));
        self
    }

    #[must_use]
    pub fn build(self) -> CapabilitySurface {
        let surface = CapabilitySurface {
            name: self.name,
            operations: self.operations,
        };
        for (operation, arity) in surface.shadowed_signatures() {
            warn!(
                surface = surface.name,
                operation, arity, "duplicate operation signature; later declaration is unreachable"
            );
        }
        surface
    }
}

// ---------------------------------------------------------------------------
// Args
// ---------------------------------------------------------------------------

/// Read-only view of the resolved positional arguments handed to a builder.
///
/// When an implicit context qualifier was supplied it is the last argument.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    operation: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    #[must_use]
    pub fn new(operation: &'static str, values: &'a [Value]) -> Self {
        Self { operation, values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &'a [Value] {
        self.values
    }

    /// Argument at `idx`.
    ///
    /// # Errors
    ///
    /// Fails when `idx` is out of range.
    pub fn get(&self, idx: usize) -> anyhow::Result<&'a Value> {
        self.values.get(idx).ok_or_else(|| {
            anyhow!(
                "{}: missing argument {idx} (got {})",
                self.operation,
                self.values.len()
            )
        })
    }

    /// String argument at `idx`.
    ///
    /// # Errors
    ///
    /// Fails when missing or not a string.
    pub fn str(&self, idx: usize) -> anyhow::Result<&'a str> {
        let value = self.get(idx)?;
        value
            .as_str()
            .with_context(|| format!("{}: argument {idx} must be a string, got {}", self.operation, value.kind()))
    }

    /// String argument at `idx`, with `null` read as absent.
    ///
    /// # Errors
    ///
    /// Fails when missing or neither a string nor null.
    pub fn opt_str(&self, idx: usize) -> anyhow::Result<Option<&'a str>> {
        match self.get(idx)? {
            Value::Null => Ok(None),
            _ => self.str(idx).map(Some),
        }
    }

    /// Integer argument at `idx`.
    ///
    /// # Errors
    ///
    /// Fails when missing or not an integer.
    pub fn i64(&self, idx: usize) -> anyhow::Result<i64> {
        let value = self.get(idx)?;
        value
            .as_i64()
            .with_context(|| format!("{}: argument {idx} must be an int, got {}", self.operation, value.kind()))
    }

    /// Boolean argument at `idx`.
    ///
    /// # Errors
    ///
    /// Fails when missing or not a boolean.
    pub fn bool(&self, idx: usize) -> anyhow::Result<bool> {
        let value = self.get(idx)?;
        value
            .as_bool()
            .with_context(|| format!("{}: argument {idx} must be a bool, got {}", self.operation, value.kind()))
    }

    /// The trailing argument, where the implicit context qualifier lands.
    ///
    /// # Errors
    ///
    /// Fails when there are no arguments or the last one is not a string.
    pub fn context(&self) -> anyhow::Result<&'a str> {
        let last = self
            .values
            .len()
            .checked_sub(1)
            .ok_or_else(|| anyhow!("{}: no context argument", self.operation))?;
        self.str(last)
    }
}
