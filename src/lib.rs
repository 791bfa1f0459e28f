pub mod ai;
#[cfg(feature = "cli")]
pub mod config;
pub mod environment;
pub mod executor;
pub mod history;
#[cfg(feature = "cli")]
pub mod interactive;
pub mod introspection;
pub mod operation;
#[cfg(feature = "cli")]
pub mod session;
pub mod settings;
pub mod storage;

#[cfg(feature = "web")]
pub mod web;
