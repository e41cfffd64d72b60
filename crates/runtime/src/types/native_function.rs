use crate::{QValue, Result};
use std::fmt;

/// The signature shared by all native functions
///
/// Native functions receive their arguments as a slice and return a single
/// value; a function with nothing to return produces Null.
pub type NativeFn = fn(&[QValue]) -> Result<QValue>;

/// A function that's implemented outside of the Quill runtime
///
/// See [QValue::NativeFunction](crate::QValue::NativeFunction)
#[derive(Clone, Copy)]
pub struct QNativeFunction {
    /// The function's name, used in error messages
    pub name: &'static str,
    /// The function implementation
    pub function: NativeFn,
}

impl QNativeFunction {
    /// Creates a new native function
    pub const fn new(name: &'static str, function: NativeFn) -> Self {
        Self { name, function }
    }
}

impl fmt::Debug for QNativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native function: {}", self.name)
    }
}
