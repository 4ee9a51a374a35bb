//! # Domain Layer
//!
//! Pure eligibility logic for course certificates.
//!
//! This module contains NO I/O dependencies.

pub mod entities;
pub mod errors;
pub mod evaluator;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use evaluator::evaluate;
pub use value_objects::*;
