//! Backoffice Core - Reactive State and Context Foundation
//!
//! This crate provides the primitives every backoffice workspace, store and
//! notification subsystem is built on. It holds no domain types.
//!
//! # Layers
//!
//! ## Observable state
//! - [`observable::State`]: a mutable box with replay-of-one subscriptions
//! - [`observable::ArrayState`]: identity-keyed collections with frozen updates
//! - [`observable::Observable`]: read-only views and derived projections
//!
//! ## Frozen collection helpers
//! - [`observable::frozen`]: pure append-or-update and partial-update functions
//!
//! ## Context host
//! - [`context::ControllerHost`]: a node in the host tree that provides and
//!   consumes typed services and scopes subscriptions to its lifetime
//! - [`context::ContextToken`]: typed lookup key with optional discriminator
//!
//! ## Lifecycle
//! - [`lifecycle::LifecycleToken`]: cooperative cancellation signal carried
//!   through async operations

#![forbid(unsafe_code)]

/// Host tree, typed context tokens and lifetime-scoped observation
pub mod context;

/// Cooperative cancellation
pub mod lifecycle;

/// Observable state containers and frozen collection helpers
pub mod observable;

pub use context::{ContextError, ContextRegistry, ContextToken, ControllerHost, HostId};
pub use lifecycle::{CancellationToken, LifecycleToken, NeverCancel};
pub use observable::{
    observe_multiple, ArrayState, BooleanState, NumberState, ObjectState, Observable, State,
    StringState, Subscription,
};
