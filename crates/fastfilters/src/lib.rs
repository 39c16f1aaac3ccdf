#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use fastfilters_tensor as tensor;

#[doc(inline)]
pub use fastfilters_filter as filter;
