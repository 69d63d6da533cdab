//! Utility functions shared by the loaders, the transformations and the binary

pub mod arrow;
pub mod io;
pub mod logging;
