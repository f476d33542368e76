//! Ordered frame sequences on disk.
//!
//! A sequence directory holds `frame_<digits>.png` files with gap-free indices. Other `.png`
//! names are rejected rather than skipped; non-PNG files are ignored.

pub(crate) mod image_io;
pub(crate) mod sequence;
