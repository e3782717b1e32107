//! BDD step definitions for ssl-check

pub mod doubles;
pub mod invocation_steps;
