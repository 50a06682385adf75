//! Pixel format descriptors and conversion to the engine's working representation.

pub(crate) mod convert;
pub(crate) mod pixel;
