//! Cross-subsystem integration tests.

pub mod e2e_scenarios;
pub mod flows;
