//! Integration test support crate
//!
//! All content lives in `tests/`; this library target exists so the crate
//! participates in the workspace build.
