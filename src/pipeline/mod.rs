//! End-to-end run: load, extract, propagate, save, export.

pub(crate) mod config;
pub(crate) mod run;
