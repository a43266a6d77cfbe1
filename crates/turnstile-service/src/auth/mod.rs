//! Authentication and authorization flow.
//!
//! ## Module Organization
//!
//! - `authorize`: Decision engine (application permission, content permission, denial outcomes)
//! - `casbin`: Casbin enforcer initialization and the repository permission evaluator
//! - `credential`: Transport credentials (Basic payloads, negotiated Windows identities)
//! - `decision`: Pipeline outcomes and phase states
//! - `elevation`: Scoped system-account elevation
//! - `identity`: Identities, well-known ids and the request-bound identity
//! - `memory`: In-memory collaborators
//! - `password`: Password hashing and verification with Argon2
//! - `permission`: Content permission kinds and values
//! - `pipeline`: The per-request authenticate / authorize / end-request pipeline
//! - `preview`: Preview image paths and their version checks
//! - `protocol`: Client protocol detection and OData path parsing
//! - `request`: Per-request context
//! - `resolve`: Identity resolution per authentication scheme
//! - `resource`: Content heads and repository paths
//! - `scheme`: Authentication scheme selection
//! - `store`: Collaborator traits
//! - `subject`: Subject types and identity expansion

pub mod authorize;
pub mod casbin;
pub mod credential;
pub mod decision;
pub mod elevation;
pub mod identity;
pub mod memory;
pub mod password;
pub mod permission;
pub mod pipeline;
pub mod preview;
pub mod protocol;
pub mod request;
pub mod resolve;
pub mod resource;
pub mod scheme;
pub mod store;
pub mod subject;


// Re-export commonly used types at module level
pub use authorize::DecisionEngine;
pub use casbin::{CasbinPermissionEvaluator, init_casbin};
pub use credential::{BasicCredential, NegotiatedIdentity, TransportCredential};
pub use decision::{AuthenticateState, AuthorizeState, Challenge, Decision};
pub use elevation::{SecurityContext, SystemAccount};
pub use identity::{BoundIdentity, Identity};
pub use permission::{PermissionKind, PermissionValue};
pub use pipeline::{AuthPipeline, AuthServices, Authentication};
pub use preview::VersionedPreviewProvider;
pub use protocol::{ODataRequest, ProtocolFlags};
pub use request::{RequestContext, RequestUrl};
pub use resolve::IdentityResolver;
pub use resource::ResourceRef;
pub use subject::{ExpandedSubjects, Subject};
