//! Route registry and role-based access control service.
//!
//! # Purpose
//! Exposes the registry core, its storage backends, the HTTP API surface,
//! configuration, and observability wiring for use by the binary and tests.
//!
//! # Notes
//! Handlers in [`api`] only talk to [`registry::Registry`]; the registry owns
//! validation and talks to a [`store::RegistryStore`].
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod registry;
pub mod store;
