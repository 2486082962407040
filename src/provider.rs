//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS-only
//! endpoints, the client authentication method, and provider quirks (scope delimiter,
//! error bodies served with `200 OK`). `strategy` defines [`ProviderStrategy`], which maps
//! token endpoint failures into the relay error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
