//! Business logic: the conversation state machine and the connection catalog

pub mod backend;
pub mod catalog;
pub mod session;
pub mod transcript;
