//! `relaycall` core: capability surfaces, operation resolution, pending requests, and fingerprints.

pub mod capability;
pub mod fingerprint;
pub mod request;
pub mod resolve;
pub mod types;

pub use capability::{Args, BuildFn, CapabilitySurface, CapabilitySurfaceBuilder, OperationDef};
pub use fingerprint::{ContentHasher, Fingerprint, FingerprintEngine, Md5Hasher, UnavailableHasher};
pub use request::{Headers, PendingRequest, RealizeError, RealizedRequest};
pub use resolve::{resolve, BoundOperation, ResolveError};
pub use types::Value;

pub use http::Method;
