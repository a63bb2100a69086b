//! Java extractor using tree-sitter
//!
//! Records the package statement, imports, every type declaration with its
//! members, and each supertype, method invocation and field access together
//! with the scope it occurs in.

use super::LanguageExtractor;
use qscore_core::{
    Expr, FileContext, Reference, ReferenceTarget, Scope, ScopeId, SourceUnit, TypeDecl,
};
use std::path::Path;
use std::sync::Arc;
use tree_sitter::{Node, Tree};

/// Subtrees nested deeper than this are skipped.
pub const MAX_DEPTH: usize = 512;

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

pub struct JavaExtractor {
    max_depth: usize,
}

impl JavaExtractor {
    pub fn new() -> Self {
        Self {
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for JavaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for JavaExtractor {
    fn extract(&self, path: &Path, tree: &Tree, source: &[u8]) -> SourceUnit {
        let root = tree.root_node();
        let context = Arc::new(file_context(root, source));

        let mut lowering = Lowering {
            source,
            context: Arc::clone(&context),
            max_depth: self.max_depth,
            types: Vec::new(),
            scopes: vec![Scope::default()],
            references: Vec::new(),
            truncated: 0,
        };
        let frame = Frame {
            enclosing: Vec::new(),
            scope: ScopeId(0),
        };
        lowering.visit(root, &frame, 0);

        if lowering.truncated > 0 {
            tracing::debug!(
                "Skipped {} subtree(s) nested deeper than {} in {}",
                lowering.truncated,
                self.max_depth,
                path.display()
            );
        }

        SourceUnit {
            path: path.to_path_buf(),
            context,
            types: lowering.types,
            scopes: lowering.scopes,
            references: lowering.references,
        }
    }
}

/// Package statement and non-static imports.
fn file_context(root: Node, source: &[u8]) -> FileContext {
    let mut context = FileContext::default();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "package_declaration" => {
                let mut inner = child.walk();
                context.package = child
                    .named_children(&mut inner)
                    .find(|n| matches!(n.kind(), "identifier" | "scoped_identifier"))
                    .and_then(|n| compact_text(n, source));
            }
            "import_declaration" => {
                let mut is_static = false;
                let mut wildcard = false;
                let mut name = None;
                let mut inner = child.walk();
                for part in child.children(&mut inner) {
                    match part.kind() {
                        "static" => is_static = true,
                        "asterisk" => wildcard = true,
                        "identifier" | "scoped_identifier" => name = compact_text(part, source),
                        _ => {}
                    }
                }
                let Some(name) = name else { continue };
                if is_static {
                    continue;
                }
                if wildcard {
                    context.wildcard_imports.push(name);
                } else {
                    let simple = name.rsplit('.').next().unwrap_or(&name).to_string();
                    context.single_imports.insert(simple, name);
                }
            }
            _ => {}
        }
    }
    context
}

/// Node text with all whitespace removed.
fn compact_text(node: Node, source: &[u8]) -> Option<String> {
    let text = node.utf8_text(source).ok()?;
    Some(text.split_whitespace().collect())
}

/// Type as written, without type arguments, array brackets or annotations.
fn type_name(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "void_type" => None,
        "generic_type" => type_name(node.named_child(0)?, source),
        "array_type" => type_name(node.child_by_field_name("element")?, source),
        "annotated_type" => {
            let count = node.named_child_count();
            type_name(node.named_child(count.checked_sub(1)?)?, source)
        }
        _ => {
            let text = node.utf8_text(source).ok()?;
            let name = strip_type_arguments(text);
            (!name.is_empty()).then_some(name)
        }
    }
}

fn strip_type_arguments(text: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth > 0 || c.is_whitespace() => {}
            _ => out.push(c),
        }
    }
    out.replace("[]", "").replace("...", "")
}

fn is_type_node(kind: &str) -> bool {
    matches!(
        kind,
        "type_identifier"
            | "scoped_type_identifier"
            | "generic_type"
            | "annotated_type"
            | "array_type"
    )
}

/// Supertypes from `extends` / `implements` clauses.
fn supertypes(node: Node, source: &[u8]) -> Vec<String> {
    let mut found = Vec::new();
    let mut cursor = node.walk();
    for clause in node.named_children(&mut cursor) {
        let list = match clause.kind() {
            "superclass" => Some(clause),
            "super_interfaces" | "extends_interfaces" => {
                let mut inner = clause.walk();
                clause
                    .named_children(&mut inner)
                    .find(|n| n.kind() == "type_list")
            }
            _ => None,
        };
        let Some(list) = list else { continue };
        let mut inner = list.walk();
        for ty in list.named_children(&mut inner) {
            if is_type_node(ty.kind()) {
                if let Some(name) = type_name(ty, source) {
                    found.push(name);
                }
            }
        }
    }
    found
}

struct Frame {
    /// Enclosing types, innermost first.
    enclosing: Vec<String>,
    scope: ScopeId,
}

struct Lowering<'a> {
    source: &'a [u8],
    context: Arc<FileContext>,
    max_depth: usize,
    types: Vec<TypeDecl>,
    scopes: Vec<Scope>,
    references: Vec<Reference>,
    truncated: usize,
}

impl Lowering<'_> {
    fn visit(&mut self, node: Node, frame: &Frame, depth: usize) {
        if depth > self.max_depth {
            self.truncated += 1;
            return;
        }

        match node.kind() {
            "package_declaration" | "import_declaration" => return,
            kind if TYPE_DECLARATIONS.contains(&kind) => {
                self.visit_type(node, frame, depth);
                return;
            }
            "method_declaration"
            | "constructor_declaration"
            | "compact_constructor_declaration" => {
                let scope = self.push_scope(frame.enclosing.clone());
                let inner = Frame {
                    enclosing: frame.enclosing.clone(),
                    scope,
                };
                self.visit_children(node, &inner, depth);
                return;
            }
            "formal_parameter" | "local_variable_declaration" | "enhanced_for_statement"
            | "resource" | "catch_formal_parameter" => self.declare_locals(node, frame.scope),
            "method_invocation" => {
                if let Some(name) = self.field_text(node, "name") {
                    let receiver = node
                        .child_by_field_name("object")
                        .map(|object| self.expr(object, depth + 1));
                    self.push_reference(ReferenceTarget::Call { receiver, name }, frame.scope);
                }
            }
            "field_access" => {
                let object = node.child_by_field_name("object");
                let field = node.child_by_field_name("field");
                if let (Some(object), Some(field)) = (object, field) {
                    if field.kind() == "identifier" {
                        if let Ok(name) = field.utf8_text(self.source) {
                            let receiver = self.expr(object, depth + 1);
                            self.push_reference(
                                ReferenceTarget::Field {
                                    receiver,
                                    name: name.to_string(),
                                },
                                frame.scope,
                            );
                        }
                    }
                }
            }
            _ => {}
        }

        self.visit_children(node, frame, depth);
    }

    fn visit_children(&mut self, node: Node, frame: &Frame, depth: usize) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child, frame, depth + 1);
        }
    }

    fn visit_type(&mut self, node: Node, frame: &Frame, depth: usize) {
        let Some(name) = self.field_text(node, "name") else {
            self.visit_children(node, frame, depth);
            return;
        };
        let qualified_name = match frame.enclosing.first() {
            Some(outer) => format!("{}.{}", outer, name),
            None => self.context.qualify(&name),
        };

        let mut decl = TypeDecl {
            qualified_name: qualified_name.clone(),
            enclosing: frame.enclosing.clone(),
            ..TypeDecl::default()
        };

        let header_scope = self.push_scope(frame.enclosing.clone());
        for supertype in supertypes(node, self.source) {
            decl.supertypes.push(supertype.clone());
            self.push_reference(ReferenceTarget::Supertype(supertype), header_scope);
        }

        self.collect_components(node, &mut decl);
        if let Some(body) = node.child_by_field_name("body") {
            self.collect_members(body, &name, &mut decl);
        }
        self.types.push(decl);

        let mut enclosing = Vec::with_capacity(frame.enclosing.len() + 1);
        enclosing.push(qualified_name);
        enclosing.extend(frame.enclosing.iter().cloned());
        let scope = self.push_scope(enclosing.clone());
        let inner = Frame { enclosing, scope };
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body, &inner, depth + 1);
        }
    }

    /// Record components become fields with same-named accessors.
    fn collect_components(&self, node: Node, decl: &mut TypeDecl) {
        let Some(parameters) = node.child_by_field_name("parameters") else {
            return;
        };
        let mut cursor = parameters.walk();
        for component in parameters.named_children(&mut cursor) {
            if component.kind() != "formal_parameter" {
                continue;
            }
            let ty = component
                .child_by_field_name("type")
                .and_then(|t| type_name(t, self.source));
            if let (Some(name), Some(ty)) = (self.field_text(component, "name"), ty) {
                decl.methods.insert(name.clone(), Some(ty.clone()));
                decl.fields.insert(name, ty);
            }
        }
    }

    fn collect_members(&self, body: Node, simple_name: &str, decl: &mut TypeDecl) {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "field_declaration" | "constant_declaration" => {
                    let Some(ty) = member
                        .child_by_field_name("type")
                        .and_then(|t| type_name(t, self.source))
                    else {
                        continue;
                    };
                    let mut inner = member.walk();
                    for declarator in member.named_children(&mut inner) {
                        if declarator.kind() != "variable_declarator" {
                            continue;
                        }
                        if let Some(name) = self.field_text(declarator, "name") {
                            decl.fields.insert(name, ty.clone());
                        }
                    }
                }
                "method_declaration" | "annotation_type_element_declaration" => {
                    if let Some(name) = self.field_text(member, "name") {
                        let ty = member
                            .child_by_field_name("type")
                            .and_then(|t| type_name(t, self.source));
                        decl.methods.insert(name, ty);
                    }
                }
                "enum_constant" => {
                    if let Some(name) = self.field_text(member, "name") {
                        decl.fields.insert(name, simple_name.to_string());
                    }
                }
                "enum_body_declarations" => self.collect_members(member, simple_name, decl),
                _ => {}
            }
        }
    }

    fn declare_locals(&mut self, node: Node, scope: ScopeId) {
        let ty = if node.kind() == "catch_formal_parameter" {
            let mut cursor = node.walk();
            let catch_type = node
                .named_children(&mut cursor)
                .find(|n| n.kind() == "catch_type");
            catch_type
                .and_then(|c| c.named_child(0))
                .and_then(|t| type_name(t, self.source))
        } else {
            node.child_by_field_name("type")
                .and_then(|t| type_name(t, self.source))
        };
        let Some(ty) = ty else { return };

        let mut names = Vec::new();
        if node.kind() == "local_variable_declaration" {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() == "variable_declarator" {
                    names.extend(self.field_text(declarator, "name"));
                }
            }
        } else {
            names.extend(self.field_text(node, "name"));
        }

        if let Some(scope) = self.scopes.get_mut(scope.0) {
            for name in names {
                scope.locals.insert(name, ty.clone());
            }
        }
    }

    /// Receiver shape of a call or field access.
    fn expr(&self, node: Node, depth: usize) -> Expr {
        if depth > self.max_depth {
            return Expr::Unknown;
        }
        match node.kind() {
            "this" => Expr::This,
            "super" => Expr::Super,
            "identifier" => node
                .utf8_text(self.source)
                .map(|name| Expr::Name(name.to_string()))
                .unwrap_or(Expr::Unknown),
            "field_access" => {
                let object = node.child_by_field_name("object");
                match (object, self.field_text(node, "field")) {
                    (Some(object), Some(field)) => {
                        Expr::Field(Box::new(self.expr(object, depth + 1)), field)
                    }
                    _ => Expr::Unknown,
                }
            }
            "method_invocation" => match self.field_text(node, "name") {
                Some(name) => Expr::Call(
                    node.child_by_field_name("object")
                        .map(|object| Box::new(self.expr(object, depth + 1))),
                    name,
                ),
                None => Expr::Unknown,
            },
            "object_creation_expression" => node
                .child_by_field_name("type")
                .and_then(|t| type_name(t, self.source))
                .map(Expr::New)
                .unwrap_or(Expr::Unknown),
            "cast_expression" => node
                .child_by_field_name("type")
                .and_then(|t| type_name(t, self.source))
                .map(Expr::Cast)
                .unwrap_or(Expr::Unknown),
            "parenthesized_expression" => match node.named_child(0) {
                Some(inner) => self.expr(inner, depth + 1),
                None => Expr::Unknown,
            },
            _ => Expr::Unknown,
        }
    }

    fn field_text(&self, node: Node, field: &str) -> Option<String> {
        let child = node.child_by_field_name(field)?;
        child.utf8_text(self.source).ok().map(str::to_string)
    }

    fn push_scope(&mut self, enclosing: Vec<String>) -> ScopeId {
        self.scopes.push(Scope {
            enclosing,
            locals: Default::default(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    fn push_reference(&mut self, target: ReferenceTarget, scope: ScopeId) {
        self.references.push(Reference { target, scope });
    }
}
