//! Operation resolution: from `(surface, name, args)` to a pending request.

use tracing::trace;

use crate::capability::{Args, CapabilitySurface};
use crate::request::PendingRequest;
use crate::types::Value;

/// An operation picked from a surface together with the request it built.
#[derive(Debug, Clone)]
pub struct BoundOperation {
    pub surface: &'static str,
    pub operation: &'static str,
    /// Position of the chosen entry in the surface's declaration order.
    pub index: usize,
    /// Arguments the builder saw, including any implicit context.
    pub args: Vec<Value>,
    pub request: PendingRequest,
}

/// Errors from resolving an operation name against a capability surface.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("{surface} has no operation named {operation}")]
    UnknownOperation {
        surface: &'static str,
        operation: String,
    },
    #[error("{surface}.{operation} takes {declared:?} arguments, got {arity}")]
    ArityMismatch {
        surface: &'static str,
        operation: String,
        arity: usize,
        declared: Vec<usize>,
    },
    #[error("{surface}.{operation} failed to build its request: {source:#}")]
    Build {
        surface: &'static str,
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Resolves `operation` on `surface` and invokes it to obtain the request.
///
/// When `context` is `Some` and non-empty it is appended as a trailing string
/// argument before arities are compared. The first declared entry whose name
/// and arity both match wins.
///
/// # Errors
///
/// - [`ResolveError::UnknownOperation`] if no entry has that name
/// - [`ResolveError::ArityMismatch`] if entries exist but none has the arity
/// - [`ResolveError::Build`] if the chosen builder fails
pub fn resolve(
    surface: &CapabilitySurface,
    operation: &str,
    mut args: Vec<Value>,
    context: Option<&str>,
) -> Result<BoundOperation, ResolveError> {
    if let Some(qualifier) = context.filter(|q| !q.is_empty()) {
        args.push(Value::String(qualifier.to_string()));
    }
    let arity = args.len();

    let Some((index, def)) = surface
        .operations()
        .iter()
        .enumerate()
        .find(|(_, op)| op.name() == operation && op.arity() == arity)
    else {
        let declared = surface.arities(operation);
        return Err(if declared.is_empty() {
            ResolveError::UnknownOperation {
                surface: surface.name(),
                operation: operation.to_string(),
            }
        } else {
            ResolveError::ArityMismatch {
                surface: surface.name(),
                operation: operation.to_string(),
                arity,
                declared,
            }
        });
    };

    trace!(surface = surface.name(), operation, arity, index, "operation resolved");

    let request = def
        .build(&Args::new(def.name(), &args))
        .map_err(|source| ResolveError::Build {
            surface: surface.name(),
            operation: def.name(),
            source,
        })?;

    Ok(BoundOperation {
        surface: surface.name(),
        operation: def.name(),
        index,
        args,
        request,
    })
}
