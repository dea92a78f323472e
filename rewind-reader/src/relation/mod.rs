//! Relations that are resolved after reconstruction returns.

pub mod lazy_collection;
pub mod live_reference;

pub use lazy_collection::{LazyRelationProxy, LoadedCollection};
pub use live_reference::LiveReference;
