// All repositories module
pub mod cex;

pub use cex::*;
