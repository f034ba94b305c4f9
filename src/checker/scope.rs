use std::collections::HashMap;

use crate::ast::Ty;

#[derive(Debug, Clone)]
pub struct VarEntry {
    pub ty: Ty,
    pub is_mutable: bool,
    pub is_ref: bool,
    pub is_initialized: bool,
}

#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub params: Vec<Ty>,
    pub ret: Ty,
    /// The `T` in `T::method`, if this entry came from an impl/trait body.
    pub impl_type: Option<String>,
    pub self_by_ref: Option<bool>,
    pub self_mutable: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct StructEntry {
    pub name: String,
    pub fields: Vec<(String, Ty)>,
}

#[derive(Debug, Clone)]
pub struct TraitEntry {
    pub name: String,
    pub is_unsafe: bool,
    pub functions: Vec<String>,
    pub super_traits: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConstEntry {
    pub ty: Ty,
}

/// One level of the scope stack (§4.2.1). Lookups cascade to the parent; insertions always
/// land in the innermost (current) scope.
#[derive(Debug, Default)]
pub struct Scope {
    pub id: usize,
    pub parent: Option<usize>,
    pub variables: HashMap<String, VarEntry>,
    pub functions: HashMap<String, FunctionEntry>,
    pub types: HashMap<String, String>,
    pub structs: HashMap<String, StructEntry>,
    pub struct_functions: HashMap<String, FunctionEntry>,
    pub traits: HashMap<String, TraitEntry>,
    pub constants: HashMap<String, ConstEntry>,
    pub possible_self: Option<String>,
}

pub struct ScopeStack {
    scopes: Vec<Scope>,
    current: usize,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack {
            scopes: vec![Scope {
                id: 0,
                parent: None,
                ..Default::default()
            }],
            current: 0,
        }
    }

    pub fn enter(&mut self) {
        let id = self.scopes.len();
        let parent = self.current;
        self.scopes.push(Scope {
            id,
            parent: Some(parent),
            possible_self: self.scopes[parent].possible_self.clone(),
            ..Default::default()
        });
        self.current = id;
    }

    pub fn exit(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    pub fn current(&self) -> &Scope {
        &self.scopes[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Scope {
        &mut self.scopes[self.current]
    }

    pub fn global(&self) -> &Scope {
        &self.scopes[0]
    }

    fn chain(&self) -> Vec<usize> {
        let mut ids = Vec::new();
        let mut cur = Some(self.current);
        while let Some(id) = cur {
            ids.push(id);
            cur = self.scopes[id].parent;
        }
        ids
    }

    pub fn find_variable(&self, name: &str) -> Option<&VarEntry> {
        self.chain().iter().find_map(|id| self.scopes[*id].variables.get(name))
    }

    pub fn find_function(&self, name: &str) -> Option<&FunctionEntry> {
        self.chain().iter().find_map(|id| self.scopes[*id].functions.get(name))
    }

    pub fn find_struct_function(&self, qualified: &str) -> Option<&FunctionEntry> {
        self.chain()
            .iter()
            .find_map(|id| self.scopes[*id].struct_functions.get(qualified))
    }

    pub fn find_struct(&self, name: &str) -> Option<&StructEntry> {
        self.chain().iter().find_map(|id| self.scopes[*id].structs.get(name))
    }

    pub fn find_trait(&self, name: &str) -> Option<&TraitEntry> {
        self.chain().iter().find_map(|id| self.scopes[*id].traits.get(name))
    }

    pub fn find_constant(&self, name: &str) -> Option<&ConstEntry> {
        self.chain().iter().find_map(|id| self.scopes[*id].constants.get(name))
    }

    pub fn possible_self(&self) -> Option<&str> {
        self.chain()
            .iter()
            .find_map(|id| self.scopes[*id].possible_self.as_deref())
    }

    pub fn declare_variable(&mut self, name: impl Into<String>, entry: VarEntry) {
        self.current_mut().variables.insert(name.into(), entry);
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
