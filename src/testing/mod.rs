//! Testing utilities and mock implementations

pub mod mocks;
