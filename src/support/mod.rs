//! Ready-made collaborators for hosting a session.
//!
//! The interpreter only knows the three seams in [`crate::interpreter`]:
//! input, intent resolution, and action dispatch. This module supplies
//! working implementations of each so a script can run without any custom
//! host code: a keyword-based intent matcher, scripted and stdin-backed
//! input sources, and an in-memory order-service back end with the
//! standard action set.

pub mod actions;
pub mod input;
pub mod intent;

pub use actions::{
    MemoryStore, OrderRecord, OrderStatus, StoreHandle, UserRecord, demo_store, standard_actions,
};
pub use input::{ScriptedInput, StdinInput};
pub use intent::KeywordResolver;
