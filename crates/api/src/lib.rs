//! `stockroom-api` — HTTP surface over the access-control and session core.
//!
//! Requests carry a bearer access token; the auth middleware resolves it to
//! an identity, the workspace middleware resolves the `X-Workspace-Id`
//! header to a tenant context, and every category/item route goes through
//! the resource access gate. The gate's decisions are authoritative here;
//! no route re-derives permissions from raw fields.

pub mod app;
pub mod context;
pub mod middleware;

pub use app::{build_app, AppServices};
