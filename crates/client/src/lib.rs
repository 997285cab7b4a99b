//! Client code for the Ouça Aqui offline worker.
//!
//! This crate provides the HTTP network layer, request classification, the
//! per-class caching strategies and the worker lifecycle dispatcher shared by
//! the server host.

pub mod background;
pub mod fetch;
pub mod router;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use background::BackgroundTasks;
pub use fetch::{FetchConfig, HttpNetwork, UrlError, resolve};
pub use router::{CacheRouter, RouteClass, RouteOutcome, RouterRules};
pub use worker::{InstallOutcome, Notification, SyncOutcome, Worker, WorkerMessage, WorkerState};
