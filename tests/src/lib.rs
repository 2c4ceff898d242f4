//! # Aware Test Suite
//!
//! End-to-end flows through the engine owner task, driven against the
//! simulated firmware.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs        # EngineHarness: owner task + simulator + notification stream
//!     ├── transactions.rs    # Exactly-once completion, timeouts, id uniqueness
//!     ├── discovery.rs       # Publish/subscribe, matches, messages, stop
//!     ├── data_paths.rs      # Security checks, peer requests, grace expiry
//!     └── lifecycle.rs       # Disable and interface-down cascades, shutdown
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p aware-tests
//! cargo test -p aware-tests integration::data_paths::
//! ```

pub mod integration;
