//! # Observable State for Workspaces, Stores and Managers
//!
//! ## Core Types
//!
//! - [`State<T>`]: a mutable value with push-based, replay-of-one
//!   subscriptions. Notifications are synchronous and in subscription order.
//!
//! - [`ArrayState<T, K>`]: an identity-keyed collection built on `State`,
//!   updated through the [`frozen`] helpers.
//!
//! - [`Observable<T>`]: a read-only view of a state, or of a projection of one.
//!
//! - [`Subscription`]: RAII guard; dropping it unsubscribes.
//!
//! ## Usage
//!
//! ```rust
//! use backoffice_core::observable::State;
//!
//! let draft = State::new(("Doc".to_string(), 1_u32));
//! let name = draft.as_observable_part(|d| d.0.clone());
//!
//! let _sub = name.subscribe(|n| println!("name is now {n}"));
//! draft.update(|d| d.1 = 2); // name unchanged, no emission
//! draft.update(|d| d.0 = "Renamed".into());
//! assert_eq!(name.get_value(), "Renamed");
//! ```

mod array;
pub mod frozen;
mod state;
mod subscription;
mod view;

pub use array::ArrayState;
pub use state::{BooleanState, CompleteFn, NextFn, NumberState, ObjectState, State, StringState};
pub use subscription::Subscription;
pub use view::{observe_multiple, MultipleObservables, Observable, ObservableSource};
