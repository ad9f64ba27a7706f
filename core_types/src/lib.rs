//! # Core Types
//!
//! Identifiers shared by the editor engine, the toolbar and the project
//! manager.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: a node key can never be confused with a
//!   project id or a listener id.
//! - **Copyable handles**: identifiers are small `Copy` values; ownership of
//!   the thing they name lives elsewhere (the document arena, the backend).
//!
//! ## Key Types
//!
//! - [`NodeKey`]: key of a node inside a document arena
//! - [`ListenerId`]: identifier of a registered editor listener
//! - [`ProjectId`]: backend identifier of a project
//! - [`TransactionId`]: identifier of a committed editor update

pub mod ids;

pub use ids::{ListenerId, NodeKey, ProjectId, TransactionId};
