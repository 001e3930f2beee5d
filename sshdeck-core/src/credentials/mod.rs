//! Credential resolution
//!
//! Turns the raw fields of a connect form into a validated
//! [`ConnectionConfig`](crate::models::ConnectionConfig) carrying exactly one
//! authentication payload.

mod resolver;

pub use resolver::{CredentialResolver, RawConnectionRequest};
