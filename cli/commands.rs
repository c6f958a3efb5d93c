pub mod completion;
pub mod config;
pub mod debug;
pub mod tree;
pub mod zip;
