//! Vault service: site/username/password operations under the root password.
//!
//! `Vault` composes the crypto layer with the credential store.  Every
//! operation borrows a `RootPassword`, which only a successful
//! `AuthStore::authenticate` can produce.

pub mod service;

pub use service::Vault;
