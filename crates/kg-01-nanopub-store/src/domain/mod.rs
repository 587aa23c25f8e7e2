//! # Domain Layer
//!
//! Pure nanopublication logic: the model, batch normalization, identity
//! allocation, skolemization and file descriptions. Nothing here touches a
//! store.

pub mod config;
pub mod data_url;
pub mod errors;
pub mod files;
pub mod identity;
pub mod nanopub;
pub mod prepare;
pub mod skolem;
