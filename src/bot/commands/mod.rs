//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// LFG request commands
pub mod lfg;

/// Server setup commands
pub mod setup;

// Export commands
pub use general::*;
pub use lfg::*;
pub use setup::*;
