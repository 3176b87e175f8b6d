//! Lifecycle events with a synchronous dispatcher.

pub mod dispatcher;
pub mod handler;
pub mod types;

pub use dispatcher::EventDispatcher;
pub use handler::QuinielaEventHandler;
pub use types::*;
