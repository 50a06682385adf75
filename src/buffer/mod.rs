pub(crate) mod raster;
pub(crate) mod store;
