//! Connection acceptance and request routing.

pub mod dispatcher;
pub mod listener;

pub use dispatcher::Dispatcher;
