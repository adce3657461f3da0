//! Request handlers. Transport only; every handler delegates to the state's
//! dependency objects.

pub mod conversations;
pub mod generate;
pub mod health;
pub mod predict;
