//! Best-effort symbol resolution over the project symbol table
//!
//! Type names resolve through nested types of the enclosing chain, single
//! type imports, the current package, on-demand imports and finally fully
//! qualified lookup. Members resolve by walking the receiver type and its
//! supertypes. Anything the table cannot answer is `Unresolved`.

use qscore_core::{
    Declaration, Expr, FileContext, Reference, ReferenceTarget, Resolution, Resolver, Scope,
    SourceUnit, SymbolTable, TypeDecl, TypeSymbol,
};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Upper bound on the number of types visited in one hierarchy walk.
pub const MAX_HIERARCHY: usize = 64;

/// A type name after resolution.
#[derive(Debug, Clone)]
enum TypeRef {
    /// Declared in the analyzed sources.
    Known(Arc<TypeSymbol>),
    /// Only known through an import; holds the qualified name.
    Library(String),
}

impl TypeRef {
    fn declaration(&self) -> Declaration {
        match self {
            TypeRef::Known(symbol) => Declaration::source(symbol.package()),
            TypeRef::Library(qualified) => {
                let package = qualified.rsplit_once('.').map(|(p, _)| p).unwrap_or("");
                Declaration::library(package)
            }
        }
    }
}

pub struct SymbolResolver {
    symbols: Arc<SymbolTable>,
}

impl SymbolResolver {
    pub fn new(symbols: Arc<SymbolTable>) -> Self {
        SymbolResolver { symbols }
    }

    fn resolve_type(
        &self,
        name: &str,
        context: &FileContext,
        enclosing: &[String],
    ) -> Option<TypeRef> {
        match name.split_once('.') {
            Some((head, rest)) => {
                if let Some(outer) = self.resolve_simple_type(head, context, enclosing) {
                    return match outer {
                        TypeRef::Known(symbol) => self
                            .symbols
                            .lookup(&format!("{}.{}", symbol.qualified_name(), rest))
                            .map(TypeRef::Known),
                        TypeRef::Library(qualified) => {
                            Some(TypeRef::Library(format!("{}.{}", qualified, rest)))
                        }
                    };
                }
                self.symbols.lookup(name).map(TypeRef::Known)
            }
            None => self.resolve_simple_type(name, context, enclosing),
        }
    }

    fn resolve_simple_type(
        &self,
        name: &str,
        context: &FileContext,
        enclosing: &[String],
    ) -> Option<TypeRef> {
        for outer in enclosing {
            if simple_name(outer) == name {
                if let Some(symbol) = self.symbols.lookup(outer) {
                    return Some(TypeRef::Known(symbol));
                }
            }
            if let Some(member) = self.symbols.lookup(&format!("{}.{}", outer, name)) {
                return Some(TypeRef::Known(member));
            }
        }

        if let Some(qualified) = context.single_imports.get(name) {
            return Some(match self.symbols.lookup(qualified) {
                Some(symbol) => TypeRef::Known(symbol),
                None => TypeRef::Library(qualified.clone()),
            });
        }

        if let Some(symbol) = self.symbols.lookup(&context.qualify(name)) {
            return Some(TypeRef::Known(symbol));
        }

        context
            .wildcard_imports
            .iter()
            .find_map(|prefix| self.symbols.lookup(&format!("{}.{}", prefix, name)))
            .map(TypeRef::Known)
    }

    /// Resolve a name written inside `symbol`'s body.
    fn resolve_member_type(&self, name: &str, symbol: &TypeSymbol) -> Option<TypeRef> {
        let mut enclosing = Vec::with_capacity(symbol.decl.enclosing.len() + 1);
        enclosing.push(symbol.qualified_name().to_string());
        enclosing.extend(symbol.decl.enclosing.iter().cloned());
        self.resolve_type(name, &symbol.context, &enclosing)
    }

    fn supertypes_of(&self, symbol: &TypeSymbol) -> Vec<TypeRef> {
        symbol
            .decl
            .supertypes
            .iter()
            .filter_map(|name| self.resolve_type(name, &symbol.context, &symbol.decl.enclosing))
            .collect()
    }

    /// Breadth-first walk from `start` through its supertypes until `probe`
    /// matches. Cycles and hierarchies larger than [`MAX_HIERARCHY`] stop the
    /// walk.
    fn find_member<T>(
        &self,
        start: Arc<TypeSymbol>,
        probe: impl Fn(&TypeDecl) -> Option<T>,
    ) -> Option<(Arc<TypeSymbol>, T)> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(symbol) = queue.pop_front() {
            if visited.len() >= MAX_HIERARCHY {
                break;
            }
            if !visited.insert(symbol.qualified_name().to_string()) {
                continue;
            }
            if let Some(found) = probe(&symbol.decl) {
                return Some((symbol, found));
            }
            for parent in self.supertypes_of(&symbol) {
                if let TypeRef::Known(parent) = parent {
                    queue.push_back(parent);
                }
            }
        }
        None
    }

    fn find_method(
        &self,
        start: Arc<TypeSymbol>,
        name: &str,
    ) -> Option<(Arc<TypeSymbol>, Option<String>)> {
        self.find_member(start, |decl| decl.methods.get(name).cloned())
    }

    fn find_field(&self, start: Arc<TypeSymbol>, name: &str) -> Option<(Arc<TypeSymbol>, String)> {
        self.find_member(start, |decl| decl.fields.get(name).cloned())
    }

    /// Static type of a receiver expression.
    fn expr_type(&self, expr: &Expr, context: &FileContext, scope: &Scope) -> Option<TypeRef> {
        match expr {
            Expr::This => self.enclosing_type(scope).map(TypeRef::Known),
            Expr::Super => {
                let current = self.enclosing_type(scope)?;
                self.supertypes_of(&current).into_iter().next()
            }
            Expr::Name(name) => {
                if let Some(ty) = scope.locals.get(name) {
                    return self.resolve_type(ty, context, &scope.enclosing);
                }
                for outer in &scope.enclosing {
                    let Some(symbol) = self.symbols.lookup(outer) else {
                        continue;
                    };
                    if let Some((owner, ty)) = self.find_field(symbol, name) {
                        return self.resolve_member_type(&ty, &owner);
                    }
                }
                self.resolve_type(name, context, &scope.enclosing)
            }
            Expr::Field(object, field) => {
                if let Some(TypeRef::Known(owner)) = self.expr_type(object, context, scope) {
                    if let Some((declaring, ty)) = self.find_field(owner, field) {
                        return self.resolve_member_type(&ty, &declaring);
                    }
                }
                let dotted = expr.dotted_name()?;
                self.resolve_type(&dotted, context, &scope.enclosing)
            }
            Expr::Call(receiver, name) => {
                let (owner, ret) = self.method_owner(receiver.as_deref(), name, context, scope)?;
                self.resolve_member_type(&ret?, &owner)
            }
            Expr::New(ty) | Expr::Cast(ty) => self.resolve_type(ty, context, &scope.enclosing),
            Expr::Unknown => None,
        }
    }

    fn enclosing_type(&self, scope: &Scope) -> Option<Arc<TypeSymbol>> {
        scope
            .enclosing
            .first()
            .and_then(|name| self.symbols.lookup(name))
    }

    /// Declaring type and return type of a method reachable from `receiver`.
    fn method_owner(
        &self,
        receiver: Option<&Expr>,
        name: &str,
        context: &FileContext,
        scope: &Scope,
    ) -> Option<(Arc<TypeSymbol>, Option<String>)> {
        let candidates: Vec<Arc<TypeSymbol>> = match receiver {
            None => scope
                .enclosing
                .iter()
                .filter_map(|outer| self.symbols.lookup(outer))
                .collect(),
            Some(Expr::Super) => {
                let current = self.enclosing_type(scope)?;
                known(self.supertypes_of(&current))
            }
            Some(expr) => known(self.expr_type(expr, context, scope).into_iter().collect()),
        };
        candidates
            .into_iter()
            .find_map(|candidate| self.find_method(candidate, name))
    }

    fn resolve_call(
        &self,
        receiver: Option<&Expr>,
        name: &str,
        context: &FileContext,
        scope: &Scope,
    ) -> Option<Declaration> {
        if let Some((owner, _)) = self.method_owner(receiver, name, context, scope) {
            return Some(Declaration::source(owner.package()));
        }
        match receiver {
            Some(expr) if *expr != Expr::Super => match self.expr_type(expr, context, scope)? {
                library @ TypeRef::Library(_) => Some(library.declaration()),
                TypeRef::Known(_) => None,
            },
            _ => None,
        }
    }

    fn resolve_field(
        &self,
        receiver: &Expr,
        name: &str,
        context: &FileContext,
        scope: &Scope,
    ) -> Option<Declaration> {
        let owners = match receiver {
            Expr::Super => {
                let current = self.enclosing_type(scope)?;
                self.supertypes_of(&current)
            }
            other => vec![self.expr_type(other, context, scope)?],
        };
        for owner in owners {
            match owner {
                TypeRef::Known(symbol) => {
                    if let Some((declaring, _)) = self.find_field(symbol, name) {
                        return Some(Declaration::source(declaring.package()));
                    }
                }
                library @ TypeRef::Library(_) => return Some(library.declaration()),
            }
        }
        None
    }
}

impl Resolver for SymbolResolver {
    fn resolve(&self, unit: &SourceUnit, reference: &Reference) -> Resolution {
        let Some(scope) = unit.scope(reference.scope) else {
            return Resolution::Unresolved;
        };
        let context = unit.context.as_ref();

        let declaration = match &reference.target {
            ReferenceTarget::Supertype(name) => self
                .resolve_type(name, context, &scope.enclosing)
                .map(|ty| ty.declaration()),
            ReferenceTarget::Call { receiver, name } => {
                self.resolve_call(receiver.as_ref(), name, context, scope)
            }
            ReferenceTarget::Field { receiver, name } => {
                self.resolve_field(receiver, name, context, scope)
            }
        };
        declaration.into()
    }
}

fn known(types: Vec<TypeRef>) -> Vec<Arc<TypeSymbol>> {
    types
        .into_iter()
        .filter_map(|ty| match ty {
            TypeRef::Known(symbol) => Some(symbol),
            TypeRef::Library(_) => None,
        })
        .collect()
}

fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
