//! Data models for the employee notes application.
//!
//! These models match the frontend TypeScript interfaces exactly for seamless interoperability.

mod archive;
mod database;
mod employee;

pub use archive::*;
pub use database::*;
pub use employee::*;
