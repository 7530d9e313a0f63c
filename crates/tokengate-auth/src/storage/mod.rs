//! Storage traits for client registrations and authorizations.
//!
//! The authentication flow only reads from storage. Backends implement
//! [`RegisteredClientRepository`] and [`AuthorizationRepository`]; the
//! [`memory`] module provides `DashMap`-backed implementations.

pub mod authorization;
pub mod client;
pub mod memory;

pub use authorization::AuthorizationRepository;
pub use client::RegisteredClientRepository;
pub use memory::{InMemoryAuthorizationRepository, InMemoryRegisteredClientRepository};
