//! Lens module
//!
//! Lenses combine query logic with the argument and output types needed to
//! drive it. They are shared by the `rir` binary and library users.
//!
//! | Lens | Description |
//! |------|-------------|
//! | `DelegationLens` | Country, containment and host-count queries over delegation feeds |
//!
//! # Architecture
//!
//! Each lens module exports:
//! - A **Lens struct** (e.g., `DelegationLens`), the entry point for all operations
//! - **Args structs**, the input arguments of lens methods
//! - **Output types**, the items and aggregates lens methods return
//!
//! ```rust,ignore
//! use rir::lens::delegation::{CountryQueryArgs, DelegationLens, IpLookupArgs};
//! ```

// DelegationLens - queries over RIR delegation feeds
pub mod delegation;
