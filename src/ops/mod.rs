pub(crate) mod catalog;
pub(crate) mod codec;
pub(crate) mod composite;
pub(crate) mod display;
pub(crate) mod filter;
pub(crate) mod source;
pub(crate) mod vector;
