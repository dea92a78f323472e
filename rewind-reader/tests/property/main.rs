//! Property tests for rewind-reader.

mod diff_properties;
mod reconstruct_properties;
