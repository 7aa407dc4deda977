//! # Feedline Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/              # Criterion benchmarks of the hot paths
//! └── src/integration/
//!     ├── flows.rs          # Cross-subsystem flows over the event bus
//!     └── e2e_scenarios.rs  # The five reference scenarios, end to end
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p fl-tests
//!
//! # By category
//! cargo test -p fl-tests integration::flows::
//! cargo test -p fl-tests integration::e2e_scenarios::
//!
//! # Benchmarks
//! cargo bench -p fl-tests
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
