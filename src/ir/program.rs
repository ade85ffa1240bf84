//! The analyzed program: functions, methods and struct definitions.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::{
    ir::{Callee, Function, StructDef},
    Error, Result,
};

/// Everything the front-end hands over for one analysis.
///
/// Functions are shared through [`Arc`] because every call stack frame keeps a
/// handle to the function it executes, and frames are cloned on every fork.
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// Free functions by name.
    functions: FxHashMap<String, Arc<Function>>,
    /// Methods by (declaring type, method name).
    methods: FxHashMap<(String, String), Arc<Function>>,
    /// Struct definitions by type name.
    structs: FxHashMap<String, StructDef>,
}

impl Program {
    /// Creates an empty program.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a function, or a method when the function has a receiver.
    pub fn add_function(&mut self, function: Function) -> Arc<Function> {
        let function = Arc::new(function);
        match function.receiver() {
            Some(receiver) => {
                self.methods.insert(
                    (receiver.to_string(), function.name().to_string()),
                    Arc::clone(&function),
                );
            }
            None => {
                self.functions
                    .insert(function.name().to_string(), Arc::clone(&function));
            }
        }
        function
    }

    /// Adds a struct definition.
    pub fn add_struct(&mut self, def: StructDef) {
        self.structs.insert(def.name.clone(), def);
    }

    /// Looks up a free function.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Arc<Function>> {
        self.functions.get(name)
    }

    /// Looks up a method by declaring type and name.
    #[must_use]
    pub fn method(&self, receiver: &str, name: &str) -> Option<&Arc<Function>> {
        self.methods
            .get(&(receiver.to_string(), name.to_string()))
    }

    /// Looks up a struct definition.
    #[must_use]
    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name)
    }

    /// Resolves a non-intrinsic call target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFunction`] when the target is not declared, and
    /// for intrinsics, which have no body.
    pub fn resolve(&self, callee: &Callee) -> Result<Arc<Function>> {
        let found = match callee {
            Callee::Function(name) => self.function(name),
            Callee::Method { receiver, name } => self.method(receiver, name),
            Callee::Intrinsic(_) => None,
        };
        found
            .cloned()
            .ok_or_else(|| Error::UnknownFunction(callee.to_string()))
    }
}
