//! Business objects: the public face of dispatch.
//!
//! A [`RemoteObject`] is the data part of a remote entity (its
//! `entity-type` and repository) plus a handle to the [`ClientContext`]
//! that executes its operations. Concrete entities embed it with
//! `#[serde(flatten)]` and declare a [`CapabilitySurface`] for their
//! operations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use relaycall_core::{CapabilitySurface, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::context::ClientContext;
use crate::dispatcher::{Call, Response};
use crate::error::DispatchError;

/// Common state of every remote business object.
///
/// Only `entity-type` and `repository` travel over the wire; the context
/// handle and the refresh flag are local.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RemoteObject {
    #[serde(rename = "entity-type")]
    entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repository: Option<String>,
    #[serde(skip)]
    refresh: AtomicBool,
    #[serde(skip)]
    ctx: Option<Arc<ClientContext>>,
}

impl RemoteObject {
    /// An object of `entity_type` attached to `ctx`.
    #[must_use]
    pub fn new(entity_type: impl Into<String>, ctx: Arc<ClientContext>) -> Self {
        Self {
            entity_type: entity_type.into(),
            ctx: Some(ctx),
            ..Self::default()
        }
    }

    /// An object with no context; every invocation fails with
    /// [`DispatchError::Detached`] until [`attach`](Self::attach) is called.
    #[must_use]
    pub fn detached(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            ..Self::default()
        }
    }

    /// Sets an explicit repository, overriding the context default.
    #[must_use]
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Binds a deserialized object to a context.
    pub fn attach(&mut self, ctx: Arc<ClientContext>) {
        self.ctx = Some(ctx);
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.ctx.is_some()
    }

    #[must_use]
    pub fn context(&self) -> Option<&Arc<ClientContext>> {
        self.ctx.as_ref()
    }

    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// The effective repository qualifier: the object's own when set and
    /// non-empty, else the context's default.
    #[must_use]
    pub fn repository(&self) -> Option<&str> {
        self.repository
            .as_deref()
            .filter(|r| !r.is_empty())
            .or_else(|| self.ctx.as_deref().and_then(ClientContext::repository))
    }

    /// Forces the next invocation to bypass and clear the result cache.
    ///
    /// The request is honored by the first invocation on this object made
    /// while caching is enabled; until then it stays pending.
    pub fn request_cache_refresh(&self) {
        self.refresh.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn refresh_pending(&self) -> bool {
        self.refresh.load(Ordering::Acquire)
    }

    /// Invokes `operation` on `surface` with `args`, qualified by this
    /// object's repository.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Detached`] without a context; otherwise whatever
    /// [`ClientContext::dispatch`] reports.
    pub fn invoke(
        &self,
        surface: &CapabilitySurface,
        operation: &str,
        args: Vec<Value>,
    ) -> Result<Response, DispatchError> {
        let ctx = self.ctx.as_ref().ok_or_else(|| DispatchError::Detached {
            entity_type: self.entity_type.clone(),
        })?;
        ctx.dispatch(
            Call::new(surface, operation, args)
                .repository(self.repository())
                .refresh(&self.refresh),
        )
    }

    /// [`invoke`](Self::invoke) and decode the body as JSON.
    ///
    /// # Errors
    ///
    /// As [`invoke`](Self::invoke), plus [`DispatchError::Decode`] when the
    /// body does not match `T`.
    pub fn invoke_json<T: DeserializeOwned>(
        &self,
        surface: &CapabilitySurface,
        operation: &str,
        args: Vec<Value>,
    ) -> Result<T, DispatchError> {
        self.invoke(surface, operation, args)?.json()
    }
}

impl Clone for RemoteObject {
    fn clone(&self) -> Self {
        Self {
            entity_type: self.entity_type.clone(),
            repository: self.repository.clone(),
            refresh: AtomicBool::new(self.refresh_pending()),
            ctx: self.ctx.clone(),
        }
    }
}
