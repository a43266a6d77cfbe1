//! Turnstile portal authentication - integration test support.
//!
//! This crate re-exports the workspace crates so integration tests can use
//! `turnstile_test::` paths.

#![allow(ambiguous_glob_reexports)]

pub mod component {
    pub use turnstile_core::*;
    pub use turnstile_service::*;

    // Re-export app middleware and handlers
    pub mod middleware {
        pub use turnstile_app::middleware::*;
    }

    // Re-export config from both core and app
    pub mod config {
        pub use turnstile_app::config::ConfigHandler;
        pub use turnstile_core::config::*;
    }
}

// Re-export top-level modules for convenience
pub mod app {
    pub use turnstile_app::*;

    pub mod api {
        pub use turnstile_app::app::api::*;
    }
}
