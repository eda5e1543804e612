//! Domain layer - pure business logic with no infrastructure dependencies.

pub mod access;
pub mod foundation;
pub mod payment;
pub mod subscription;
