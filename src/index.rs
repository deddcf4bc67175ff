//! Package-scoped type index: the type oracle shipped with capcheck.
//!
//! The index is built from the parsed files themselves and answers the
//! oracle queries the engine needs: declared types (struct fields,
//! interface method sets with embedding), method sets with receiver
//! pointer-ness, package-level variables, lexically scoped variable typing,
//! and declaration identities. It is deliberately file-local knowledge —
//! nothing is inferred through function results or imports beyond the files
//! handed to it — and unresolved questions answer `None`, which the engine
//! treats as a reason to skip, never to report.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;
use tree_sitter::Node;

use crate::ast;
use crate::driver::SourceFile;
use crate::oracle::{DefId, Selection, TypeOracle, TypeRef};

/// Bound on recursive expression-type inference. Initializer chains are
/// short in practice; the bound only stops degenerate self-references.
const MAX_INFER_DEPTH: usize = 16;

type TypeKey = (String, String);

#[derive(Debug)]
enum TypeDef {
    Struct { fields: Vec<FieldDef> },
    Interface { methods: Vec<String>, embeds: Vec<TypeKey> },
    Other,
}

#[derive(Debug)]
struct FieldDef {
    name: String,
    ty: TypeRef,
}

#[derive(Debug)]
struct MethodDef {
    name: String,
    pointer_receiver: bool,
}

// =============================================================================
// Index construction
// =============================================================================

/// Type information extracted from a set of parsed files, keyed by
/// (package, name). Read-only once built; safe to share across the
/// per-file analysis tasks.
pub struct PackageIndex<'a> {
    files: &'a [SourceFile],
    types: FxHashMap<TypeKey, TypeDef>,
    methods: FxHashMap<TypeKey, Vec<MethodDef>>,
    package_vars: FxHashMap<TypeKey, TypeRef>,
    packages: FxHashSet<String>,
}

impl<'a> PackageIndex<'a> {
    /// Build the index over all given files.
    #[must_use]
    pub fn new(files: &'a [SourceFile]) -> Self {
        let mut index = Self {
            files,
            types: FxHashMap::default(),
            methods: FxHashMap::default(),
            package_vars: FxHashMap::default(),
            packages: FxHashSet::default(),
        };
        for file in files {
            index.ingest(file);
        }
        index
    }

    /// An oracle view bound to one of the indexed files. Expression and
    /// identifier queries must pass nodes from that file's tree.
    #[must_use]
    pub fn oracle_for<'b>(&'b self, file: &'b SourceFile) -> FileOracle<'b> {
        debug_assert!(self.files.iter().any(|f| std::ptr::eq(f, file)));
        FileOracle { index: self, file }
    }

    fn ingest(&mut self, file: &SourceFile) {
        let package = file.package.clone();
        self.packages.insert(package.clone());

        for decl in ast::named_children(file.tree.root_node()) {
            match decl.kind() {
                "type_declaration" => {
                    for spec in ast::named_children(decl) {
                        if spec.kind() != "type_spec" {
                            continue;
                        }
                        self.ingest_type_spec(file, &package, spec);
                    }
                }
                "method_declaration" => self.ingest_method(file, &package, decl),
                "var_declaration" => self.ingest_package_vars(file, &package, decl),
                _ => {}
            }
        }
    }

    fn ingest_type_spec(&mut self, file: &SourceFile, package: &str, spec: Node<'_>) {
        let Some(name_node) = ast::field(spec, "name") else {
            return;
        };
        let Some(ty_node) = ast::field(spec, "type") else {
            return;
        };
        let name = ast::node_text(&file.source, name_node).to_string();
        let def = match ty_node.kind() {
            "struct_type" => TypeDef::Struct {
                fields: struct_fields(file, package, ty_node),
            },
            "interface_type" => {
                let (methods, embeds) = interface_elems(file, package, ty_node);
                TypeDef::Interface { methods, embeds }
            }
            _ => TypeDef::Other,
        };
        trace!(package = package, name = %name, "indexed type");
        self.types.insert((package.to_string(), name), def);
    }

    fn ingest_method(&mut self, file: &SourceFile, package: &str, decl: Node<'_>) {
        let Some(name_node) = ast::field(decl, "name") else {
            return;
        };
        let Some(receiver) = ast::field(decl, "receiver") else {
            return;
        };
        let Some(clause) = ast::named_children(receiver)
            .into_iter()
            .find(|n| n.kind() == "parameter_declaration")
        else {
            return;
        };
        let Some(ty_node) = ast::field(clause, "type") else {
            return;
        };
        let (base, pointer_receiver) = match ty_node.kind() {
            "pointer_type" => match ty_node.named_child(0) {
                Some(inner) => (inner, true),
                None => return,
            },
            _ => (ty_node, false),
        };
        let base = match base.kind() {
            "generic_type" => match ast::field(base, "type") {
                Some(inner) => inner,
                None => return,
            },
            _ => base,
        };
        if base.kind() != "type_identifier" {
            return;
        }
        let recv_name = ast::node_text(&file.source, base).to_string();
        let method = MethodDef {
            name: ast::node_text(&file.source, name_node).to_string(),
            pointer_receiver,
        };
        self.methods
            .entry((package.to_string(), recv_name))
            .or_default()
            .push(method);
    }

    fn ingest_package_vars(&mut self, file: &SourceFile, package: &str, decl: Node<'_>) {
        for spec in var_specs(decl) {
            let Some(ty_node) = ast::field(spec, "type") else {
                continue;
            };
            let Some(ty) = resolve_type_ref(package, &file.source, ty_node) else {
                continue;
            };
            for name_node in ast::field_children(spec, "name") {
                let name = ast::node_text(&file.source, name_node);
                if name == "_" {
                    continue;
                }
                self.package_vars
                    .insert((package.to_string(), name.to_string()), ty.clone());
            }
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    fn has_package(&self, name: &str) -> bool {
        self.packages.contains(name)
    }

    fn type_def(&self, ty: &TypeRef) -> Option<&TypeDef> {
        self.types.get(&(ty.package.clone(), ty.name.clone()))
    }

    fn struct_field(&self, ty: &TypeRef, field: &str) -> Option<TypeRef> {
        match self.type_def(ty)? {
            TypeDef::Struct { fields } => fields
                .iter()
                .find(|f| f.name == field)
                .map(|f| f.ty.clone()),
            _ => None,
        }
    }

    fn has_method(&self, ty: &TypeRef, name: &str) -> bool {
        if let Some(methods) = self.methods.get(&(ty.package.clone(), ty.name.clone())) {
            if methods.iter().any(|m| m.name == name) {
                return true;
            }
        }
        self.interface_method_set(ty)
            .is_some_and(|set| set.iter().any(|m| m == name))
    }

    /// The embedding-expanded method set of an interface, or `None` when
    /// the type is unknown or not an interface.
    fn interface_method_set(&self, ty: &TypeRef) -> Option<Vec<String>> {
        let key = (ty.package.clone(), ty.name.clone());
        if !matches!(self.types.get(&key), Some(TypeDef::Interface { .. })) {
            return None;
        }
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        self.expand_interface(&key, &mut seen, &mut out);
        Some(out)
    }

    fn expand_interface(
        &self,
        key: &TypeKey,
        seen: &mut FxHashSet<TypeKey>,
        out: &mut Vec<String>,
    ) {
        if !seen.insert(key.clone()) {
            return;
        }
        if let Some(TypeDef::Interface { methods, embeds }) = self.types.get(key) {
            for method in methods {
                if !out.contains(method) {
                    out.push(method.clone());
                }
            }
            for embed in embeds {
                self.expand_interface(embed, seen, out);
            }
        }
    }

    /// Interface satisfaction.
    ///
    /// A concrete type satisfies an interface when every interface method is
    /// in its method set; methods declared on a pointer receiver belong only
    /// to the pointer form. An interface satisfies another when its method
    /// set is a superset.
    fn type_implements(&self, ty: &TypeRef, iface: &TypeRef) -> bool {
        let Some(wanted) = self.interface_method_set(iface) else {
            return false;
        };
        if matches!(self.type_def(ty), Some(TypeDef::Interface { .. })) {
            let Some(own) = self.interface_method_set(ty) else {
                return false;
            };
            return wanted.iter().all(|m| own.contains(m));
        }
        let methods = self.methods.get(&(ty.package.clone(), ty.name.clone()));
        wanted.iter().all(|m| {
            methods.is_some_and(|ms| {
                ms.iter()
                    .any(|md| md.name == *m && (!md.pointer_receiver || ty.pointer))
            })
        })
    }
}

fn struct_fields(file: &SourceFile, package: &str, struct_ty: Node<'_>) -> Vec<FieldDef> {
    let mut fields = Vec::new();
    let Some(list) = ast::named_children(struct_ty)
        .into_iter()
        .find(|n| n.kind() == "field_declaration_list")
    else {
        return fields;
    };
    for decl in ast::named_children(list) {
        if decl.kind() != "field_declaration" {
            continue;
        }
        let Some(ty_node) = ast::field(decl, "type") else {
            continue;
        };
        let Some(ty) = resolve_type_ref(package, &file.source, ty_node) else {
            continue;
        };
        for name_node in ast::field_children(decl, "name") {
            fields.push(FieldDef {
                name: ast::node_text(&file.source, name_node).to_string(),
                ty: ty.clone(),
            });
        }
    }
    fields
}

fn interface_elems(
    file: &SourceFile,
    package: &str,
    iface_ty: Node<'_>,
) -> (Vec<String>, Vec<TypeKey>) {
    let mut methods = Vec::new();
    let mut embeds = Vec::new();
    ast::walk(iface_ty, &mut |node| {
        match node.kind() {
            // Grammar revisions name interface methods differently.
            "method_elem" | "method_spec" => {
                if let Some(name) = ast::field(node, "name") {
                    methods.push(ast::node_text(&file.source, name).to_string());
                }
                return false;
            }
            "type_identifier" => {
                embeds.push((
                    package.to_string(),
                    ast::node_text(&file.source, node).to_string(),
                ));
            }
            "qualified_type" => {
                if let (Some(pkg), Some(name)) =
                    (ast::field(node, "package"), ast::field(node, "name"))
                {
                    embeds.push((
                        ast::node_text(&file.source, pkg).to_string(),
                        ast::node_text(&file.source, name).to_string(),
                    ));
                }
                return false;
            }
            _ => {}
        }
        true
    });
    (methods, embeds)
}

/// The `var_spec` nodes of a `var` declaration, grouped or not.
fn var_specs(decl: Node<'_>) -> Vec<Node<'_>> {
    let mut specs = Vec::new();
    for child in ast::named_children(decl) {
        match child.kind() {
            "var_spec" => specs.push(child),
            "var_spec_list" => {
                specs.extend(
                    ast::named_children(child)
                        .into_iter()
                        .filter(|n| n.kind() == "var_spec"),
                );
            }
            _ => {}
        }
    }
    specs
}

/// Resolve a nominal type expression against a package context.
fn resolve_type_ref(package: &str, source: &str, node: Node<'_>) -> Option<TypeRef> {
    match node.kind() {
        "type_identifier" | "identifier" => {
            Some(TypeRef::new(package, ast::node_text(source, node)))
        }
        "qualified_type" => {
            let pkg = ast::field(node, "package")?;
            let name = ast::field(node, "name")?;
            Some(TypeRef::new(
                ast::node_text(source, pkg),
                ast::node_text(source, name),
            ))
        }
        "pointer_type" => {
            let inner = resolve_type_ref(package, source, node.named_child(0)?)?;
            if inner.pointer {
                return None;
            }
            Some(inner.as_pointer())
        }
        "generic_type" => resolve_type_ref(package, source, ast::field(node, "type")?),
        _ => None,
    }
}

// =============================================================================
// Per-file oracle
// =============================================================================

/// Internal expression type: named types plus the anonymous shapes that
/// show up mid-chain (inline struct literals, arrays).
#[derive(Debug, Clone)]
enum Ty<'t> {
    Named(TypeRef),
    Anon(Node<'t>),
    Array(Box<Ty<'t>>),
}

/// A lexical binding site for a variable.
enum Binding<'t> {
    Typed { ident: Node<'t>, ty: Node<'t> },
    Init { ident: Node<'t>, expr: Option<Node<'t>> },
}

impl<'t> Binding<'t> {
    fn ident(&self) -> Node<'t> {
        match self {
            Binding::Typed { ident, .. } | Binding::Init { ident, .. } => *ident,
        }
    }
}

/// [`TypeOracle`] view of a [`PackageIndex`] bound to one file.
pub struct FileOracle<'a> {
    index: &'a PackageIndex<'a>,
    file: &'a SourceFile,
}

impl<'a> FileOracle<'a> {
    fn text(&self, node: Node<'_>) -> &str {
        ast::node_text(&self.file.source, node)
    }

    fn type_expr_to_ty<'t>(&self, node: Node<'t>, depth: usize) -> Option<Ty<'t>> {
        if depth == 0 {
            return None;
        }
        match node.kind() {
            "struct_type" => Some(Ty::Anon(node)),
            "array_type" | "slice_type" => {
                let elem = ast::field(node, "element")?;
                Some(Ty::Array(Box::new(self.type_expr_to_ty(elem, depth - 1)?)))
            }
            _ => resolve_type_ref(&self.file.package, &self.file.source, node).map(Ty::Named),
        }
    }

    fn infer_expr_ty<'t>(&self, expr: Node<'t>, depth: usize) -> Option<Ty<'t>> {
        if depth == 0 {
            return None;
        }
        match expr.kind() {
            "identifier" => self.var_ty(expr, depth),
            "selector_expression" => {
                let operand = ast::field(expr, "operand")?;
                let member = ast::field(expr, "field")?;
                // A package qualifier is not a value; resolve `pkg.X` from
                // the package's own scope instead.
                if operand.kind() == "identifier" && self.lookup_binding(operand).is_none() {
                    let pkg = self.text(operand);
                    if self.index.has_package(pkg) {
                        return self
                            .index
                            .package_vars
                            .get(&(pkg.to_string(), self.text(member).to_string()))
                            .cloned()
                            .map(Ty::Named);
                    }
                }
                let recv = self.infer_expr_ty(operand, depth - 1)?;
                self.field_ty(recv, self.text(member), depth)
            }
            "index_expression" => {
                let operand = ast::field(expr, "operand")?;
                match self.infer_expr_ty(operand, depth - 1)? {
                    Ty::Array(elem) => Some(*elem),
                    _ => None,
                }
            }
            "unary_expression" => {
                let operator = ast::field(expr, "operator")?;
                let operand = ast::field(expr, "operand")?;
                match self.text(operator) {
                    "&" => match self.infer_expr_ty(operand, depth - 1)? {
                        Ty::Named(t) if !t.pointer => Some(Ty::Named(t.as_pointer())),
                        _ => None,
                    },
                    "*" => match self.infer_expr_ty(operand, depth - 1)? {
                        Ty::Named(t) if t.pointer => Some(Ty::Named(t.deref())),
                        _ => None,
                    },
                    _ => None,
                }
            }
            "composite_literal" => {
                let ty = ast::field(expr, "type")?;
                self.type_expr_to_ty(ty, depth - 1)
            }
            "parenthesized_expression" => self.infer_expr_ty(expr.named_child(0)?, depth - 1),
            // Function results are not tracked.
            _ => None,
        }
    }

    fn var_ty<'t>(&self, ident: Node<'t>, depth: usize) -> Option<Ty<'t>> {
        if let Some(binding) = self.lookup_binding(ident) {
            return match binding {
                Binding::Typed { ty, .. } => self.type_expr_to_ty(ty, depth - 1),
                Binding::Init { expr, .. } => self.infer_expr_ty(expr?, depth - 1),
            };
        }
        self.index
            .package_vars
            .get(&(self.file.package.clone(), self.text(ident).to_string()))
            .cloned()
            .map(Ty::Named)
    }

    fn field_ty<'t>(&self, ty: Ty<'t>, field: &str, depth: usize) -> Option<Ty<'t>> {
        match ty {
            Ty::Named(t) => {
                // Field access auto-derefs one pointer level.
                let base = if t.pointer { t.deref() } else { t };
                self.index.struct_field(&base, field).map(Ty::Named)
            }
            Ty::Anon(node) => {
                let list = ast::named_children(node)
                    .into_iter()
                    .find(|n| n.kind() == "field_declaration_list")?;
                for decl in ast::named_children(list) {
                    if decl.kind() != "field_declaration" {
                        continue;
                    }
                    let matches = ast::field_children(decl, "name")
                        .into_iter()
                        .any(|n| self.text(n) == field);
                    if matches {
                        return self.type_expr_to_ty(ast::field(decl, "type")?, depth - 1);
                    }
                }
                None
            }
            Ty::Array(_) => None,
        }
    }

    // -------------------------------------------------------------------------
    // Lexical binding resolution
    // -------------------------------------------------------------------------

    /// Find the innermost binding of an identifier use: enclosing blocks
    /// are searched for the closest preceding declaration, function scopes
    /// for parameters and receivers, file scope without position order.
    fn lookup_binding<'t>(&self, use_ident: Node<'t>) -> Option<Binding<'t>> {
        let name = self.text(use_ident);
        if name == "_" {
            return None;
        }
        let use_start = use_ident.start_byte();
        let mut node = use_ident;
        while let Some(ancestor) = node.parent() {
            match ancestor.kind() {
                "block" | "source_file" => {
                    let positional = ancestor.kind() == "block";
                    let mut found = None;
                    for stmt in ast::named_children(ancestor) {
                        if positional && stmt.start_byte() >= use_start {
                            break;
                        }
                        if let Some(binding) = self.binding_in_stmt(stmt, name) {
                            found = Some(binding);
                        }
                    }
                    if found.is_some() {
                        return found;
                    }
                }
                "func_literal" | "function_declaration" | "method_declaration" => {
                    if let Some(binding) = self.binding_in_params(ancestor, name) {
                        return Some(binding);
                    }
                }
                "if_statement" | "for_statement" => {
                    if let Some(init) = ast::field(ancestor, "initializer") {
                        if let Some(binding) = self.binding_in_stmt(init, name) {
                            return Some(binding);
                        }
                    }
                }
                _ => {}
            }
            node = ancestor;
        }
        None
    }

    fn binding_in_stmt<'t>(&self, stmt: Node<'t>, name: &str) -> Option<Binding<'t>> {
        match stmt.kind() {
            "short_var_declaration" => {
                let left = ast::field(stmt, "left")?;
                let right = ast::field(stmt, "right");
                for (i, ident) in ast::named_children(left).into_iter().enumerate() {
                    if ident.kind() == "identifier" && self.text(ident) == name {
                        let expr = right.and_then(|r| r.named_child(i));
                        return Some(Binding::Init { ident, expr });
                    }
                }
                None
            }
            "var_declaration" => {
                for spec in var_specs(stmt) {
                    let ty = ast::field(spec, "type");
                    let value = ast::field(spec, "value");
                    for (i, ident) in ast::field_children(spec, "name").into_iter().enumerate() {
                        if self.text(ident) != name {
                            continue;
                        }
                        if let Some(ty) = ty {
                            return Some(Binding::Typed { ident, ty });
                        }
                        let expr = value.and_then(|v| v.named_child(i));
                        return Some(Binding::Init { ident, expr });
                    }
                }
                None
            }
            _ => None,
        }
    }

    fn binding_in_params<'t>(&self, fn_node: Node<'t>, name: &str) -> Option<Binding<'t>> {
        for list_field in ["parameters", "receiver"] {
            let Some(list) = ast::field(fn_node, list_field) else {
                continue;
            };
            for clause in ast::named_children(list) {
                if !matches!(
                    clause.kind(),
                    "parameter_declaration" | "variadic_parameter_declaration"
                ) {
                    continue;
                }
                let Some(ty) = ast::field(clause, "type") else {
                    continue;
                };
                for ident in ast::field_children(clause, "name") {
                    if self.text(ident) == name {
                        return Some(Binding::Typed { ident, ty });
                    }
                }
            }
        }
        None
    }

    /// Whether an identifier node is itself a binding occurrence.
    fn is_defining_occurrence(&self, ident: Node<'_>) -> bool {
        let Some(parent) = ident.parent() else {
            return false;
        };
        match parent.kind() {
            "parameter_declaration" | "variadic_parameter_declaration" | "var_spec" => {
                ast::field_children(parent, "name")
                    .into_iter()
                    .any(|n| n.id() == ident.id())
            }
            "expression_list" => {
                let Some(grand) = parent.parent() else {
                    return false;
                };
                grand.kind() == "short_var_declaration"
                    && ast::field(grand, "left").is_some_and(|left| left.id() == parent.id())
            }
            _ => false,
        }
    }
}

impl TypeOracle for FileOracle<'_> {
    fn selection(&self, sel: Node<'_>) -> Option<Selection> {
        if sel.kind() != "selector_expression" {
            return None;
        }
        let operand = ast::field(sel, "operand")?;
        let member_node = ast::field(sel, "field")?;
        let member = self.text(member_node).to_string();

        let receiver = match self.infer_expr_ty(operand, MAX_INFER_DEPTH)? {
            Ty::Named(t) => t,
            _ => return None,
        };
        let base = receiver.deref();
        let is_method = self.index.has_method(&base, &member);
        Some(Selection {
            receiver,
            member,
            is_method,
        })
    }

    fn resolve_type(&self, ty: Node<'_>) -> Option<TypeRef> {
        resolve_type_ref(&self.file.package, &self.file.source, ty)
    }

    fn is_interface(&self, ty: &TypeRef) -> bool {
        matches!(self.index.type_def(ty), Some(TypeDef::Interface { .. }))
    }

    fn interface_methods(&self, ty: &TypeRef) -> Option<Vec<String>> {
        self.index.interface_method_set(ty)
    }

    fn implements(&self, ty: &TypeRef, iface: &TypeRef) -> bool {
        self.index.type_implements(ty, iface)
    }

    fn definition(&self, ident: Node<'_>) -> Option<DefId> {
        if self.is_defining_occurrence(ident) {
            return Some(DefId(ident.start_byte()));
        }
        self.lookup_binding(ident)
            .map(|binding| DefId(binding.ident().start_byte()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::parse_source;

    fn index_of(files: &[SourceFile]) -> PackageIndex<'_> {
        PackageIndex::new(files)
    }

    /// The selector expression of the first call matching `chain`.
    fn call_selector<'t>(file: &'t SourceFile, chain: &str) -> Node<'t> {
        let mut found = None;
        ast::walk(file.tree.root_node(), &mut |n| {
            if found.is_none() && ast::is_call_expression(n) {
                if let Some(fun) = ast::field(n, "function") {
                    if fun.kind() == "selector_expression"
                        && ast::node_text(&file.source, fun) == chain
                    {
                        found = Some(fun);
                        return false;
                    }
                }
            }
            true
        });
        found.expect("fixture contains the call")
    }

    const PACKAGE: &str = r#"package main

type MyInterface interface {
	Do()
}

type Extended interface {
	MyInterface
	More()
}

type MyImpl struct{}

func (m *MyImpl) Do() {}

type ValueImpl struct{}

func (v ValueImpl) Do() {}

type HasMyImpl struct {
	A MyImpl
}

func main() {
	outer := MyImpl{}
	outer2 := HasMyImpl{A: MyImpl{}}
	outer2.A.Do()
	outer.Do()
}
"#;

    #[test]
    fn test_pointer_receiver_methods_need_pointer_form() {
        let files = [parse_source("main.go", PACKAGE).unwrap()];
        let index = index_of(&files);
        let value = TypeRef::new("main", "MyImpl");
        let iface = TypeRef::new("main", "MyInterface");
        assert!(!index.type_implements(&value, &iface));
        assert!(index.type_implements(&value.as_pointer(), &iface));
    }

    #[test]
    fn test_value_receiver_methods_satisfy_both_forms() {
        let files = [parse_source("main.go", PACKAGE).unwrap()];
        let index = index_of(&files);
        let value = TypeRef::new("main", "ValueImpl");
        let iface = TypeRef::new("main", "MyInterface");
        assert!(index.type_implements(&value, &iface));
        assert!(index.type_implements(&value.as_pointer(), &iface));
    }

    #[test]
    fn test_embedded_interface_method_set() {
        let files = [parse_source("main.go", PACKAGE).unwrap()];
        let index = index_of(&files);
        let extended = TypeRef::new("main", "Extended");
        let mut methods = index.interface_method_set(&extended).unwrap();
        methods.sort();
        assert_eq!(methods, ["Do", "More"]);
        // An interface satisfies a smaller interface it embeds.
        assert!(index.type_implements(&extended, &TypeRef::new("main", "MyInterface")));
    }

    #[test]
    fn test_selection_resolves_field_chain() {
        let files = [parse_source("main.go", PACKAGE).unwrap()];
        let index = index_of(&files);
        let oracle = index.oracle_for(&files[0]);
        let sel = call_selector(&files[0], "outer2.A.Do");
        let selection = oracle.selection(sel).unwrap();
        assert_eq!(selection.receiver, TypeRef::new("main", "MyImpl"));
        assert_eq!(selection.member, "Do");
        assert!(selection.is_method);
    }

    #[test]
    fn test_selection_of_local_variable() {
        let files = [parse_source("main.go", PACKAGE).unwrap()];
        let index = index_of(&files);
        let oracle = index.oracle_for(&files[0]);
        let sel = call_selector(&files[0], "outer.Do");
        let selection = oracle.selection(sel).unwrap();
        assert_eq!(selection.receiver, TypeRef::new("main", "MyImpl"));
    }

    const SHADOWED: &str = r#"package main

type T struct{}

func (t T) Do() {}

func main() {
	x := T{}
	x.Do()
	{
		x := &T{}
		x.Do()
	}
}
"#;

    #[test]
    fn test_shadowed_variable_resolves_to_innermost_declaration() {
        let files = [parse_source("main.go", SHADOWED).unwrap()];
        let index = index_of(&files);
        let oracle = index.oracle_for(&files[0]);

        // Collect both `x.Do` selectors in source order.
        let mut selectors = Vec::new();
        ast::walk(files[0].tree.root_node(), &mut |n| {
            if n.kind() == "selector_expression" {
                selectors.push(n);
                return false;
            }
            true
        });
        assert_eq!(selectors.len(), 2);

        let outer = oracle.selection(selectors[0]).unwrap();
        let inner = oracle.selection(selectors[1]).unwrap();
        assert!(!outer.receiver.pointer);
        assert!(inner.receiver.pointer);

        let outer_def = oracle.definition(ast::field(selectors[0], "operand").unwrap());
        let inner_def = oracle.definition(ast::field(selectors[1], "operand").unwrap());
        assert!(outer_def.is_some());
        assert!(inner_def.is_some());
        assert_ne!(outer_def, inner_def);
    }

    #[test]
    fn test_defining_occurrence_is_its_own_definition() {
        let files = [parse_source("main.go", SHADOWED).unwrap()];
        let index = index_of(&files);
        let oracle = index.oracle_for(&files[0]);

        let mut first_decl = None;
        ast::walk(files[0].tree.root_node(), &mut |n| {
            if first_decl.is_none() && n.kind() == "short_var_declaration" {
                let left = ast::field(n, "left").unwrap();
                first_decl = ast::named_children(left).into_iter().next();
                return false;
            }
            true
        });
        let decl = first_decl.unwrap();
        assert_eq!(oracle.definition(decl), Some(DefId(decl.start_byte())));
    }

    #[test]
    fn test_cross_package_types_resolve() {
        let main_src = r#"package main

func main() {
	outer := mypkg.MyImpl{}
	outer.Do()
}
"#;
        let pkg_src = r#"package mypkg

type MyInterface interface {
	Do()
}

type MyImpl struct{}

func (m *MyImpl) Do() {}
"#;
        let files = [
            parse_source("main.go", main_src).unwrap(),
            parse_source("mypkg/mypkg.go", pkg_src).unwrap(),
        ];
        let index = index_of(&files);
        let oracle = index.oracle_for(&files[0]);
        let sel = call_selector(&files[0], "outer.Do");
        let selection = oracle.selection(sel).unwrap();
        assert_eq!(selection.receiver, TypeRef::new("mypkg", "MyImpl"));
        assert!(index.type_implements(
            &selection.receiver.as_pointer(),
            &TypeRef::new("mypkg", "MyInterface")
        ));
    }

    #[test]
    fn test_package_level_vars_are_visible() {
        let src = r#"package main

type T struct{}

func (t T) Do() {}

var shared T

func main() {
	shared.Do()
}
"#;
        let files = [parse_source("main.go", src).unwrap()];
        let index = index_of(&files);
        let oracle = index.oracle_for(&files[0]);
        let sel = call_selector(&files[0], "shared.Do");
        assert_eq!(
            oracle.selection(sel).unwrap().receiver,
            TypeRef::new("main", "T")
        );
    }
}
