//! Library crate root re-exporting the cache, credential, launcher, and CLI modules.

#[path = "lib/mod.rs"]
pub mod lib_mod;
pub use lib_mod as lib;
pub mod cache;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod launcher;
