// crates/storefront-cli/src/lib.rs
// ============================================================================
// Module: Storefront CLI Library
// Description: Load generation and reporting for the storefront binary.
// Purpose: Keep benchmark logic testable outside the command dispatcher.
// Dependencies: reqwest, serde, tokio
// ============================================================================

//! ## Overview
//! The `storefront` binary (`src/main.rs`) serves roles and seeds running
//! servers. This library holds the parts worth testing on their own: the
//! virtual-user load generator ([`bench`]) and the markdown comparison
//! report ([`report`]).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bench;
pub mod report;
