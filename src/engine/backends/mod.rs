//! Speech engine backends

pub mod mock;
#[cfg(feature = "native")]
pub mod native;

pub use mock::MockEngine;
#[cfg(feature = "native")]
pub use native::NativeEngine;
