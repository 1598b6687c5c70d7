//! `stockbook-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, calendar dates used as record keys, and the domain error type.

pub mod date;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use date::RecordDate;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::RecordId;
pub use value_object::ValueObject;
