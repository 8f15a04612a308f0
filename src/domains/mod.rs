// Domain modules
pub mod cex;
