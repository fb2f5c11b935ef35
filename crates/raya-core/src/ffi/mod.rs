// FFI support for native modules

pub mod native;

pub use native::{FromRaya, NativeError, NativeFn, NativeModule, NativeValue, ToRaya};
