//! Domain layer: repository traits for the emissions-test backend and the
//! pure services the controllers are built on.

pub mod repository;
pub mod service;
