use crate::function::{Function, FunctionSignature};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: IndexMap<String, Function>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: IndexMap::new(),
        }
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions
            .insert(function.signature.name.clone(), function);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn get_function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.get_mut(name)
    }

    pub fn symbol_table(&self) -> SymbolTable {
        SymbolTable::from_module(self)
    }
}

/// Resolves a callee name to the signature it is declared with.
pub trait SymbolResolver {
    fn resolve(&self, name: &str) -> Option<&FunctionSignature>;
}

impl SymbolResolver for Module {
    fn resolve(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name).map(|f| &f.signature)
    }
}

/// Snapshot of every signature in a module, so one function can be
/// rewritten while callees are still looked up by name.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    signatures: IndexMap<String, FunctionSignature>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_module(module: &Module) -> Self {
        let signatures = module
            .functions
            .iter()
            .map(|(name, function)| (name.clone(), function.signature.clone()))
            .collect();
        Self { signatures }
    }

    pub fn declare(&mut self, signature: FunctionSignature) {
        self.signatures.insert(signature.name.clone(), signature);
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl SymbolResolver for SymbolTable {
    fn resolve(&self, name: &str) -> Option<&FunctionSignature> {
        self.signatures.get(name)
    }
}
