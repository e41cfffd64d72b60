//! The core library for the Quill runtime
//!
//! Core library modules are importable by name from scripts. Each module is
//! a map of native functions (and the occasional constant) that gets frozen
//! when it's handed to a VM.

pub mod math;
pub mod string;

use crate::{vm::ModuleMap, QMap, QValue};

/// The Quill runtime's core library
#[derive(Clone)]
#[allow(missing_docs)]
pub struct CoreLib {
    pub math: QMap,
    pub string: QMap,
}

impl CoreLib {
    /// The core library as a module registry
    ///
    /// Modules are frozen so that scripts can't mutate shared library state.
    pub fn modules(&self) -> ModuleMap {
        let mut result = ModuleMap::default();
        result.insert("math".into(), QValue::FrozenMap(self.math.clone()));
        result.insert("string".into(), QValue::FrozenMap(self.string.clone()));
        result
    }
}

impl Default for CoreLib {
    fn default() -> Self {
        Self {
            math: math::make_module(),
            string: string::make_module(),
        }
    }
}
