//! Property tests for rewind-core.

mod codec_properties;
mod identifier_properties;
