//! Selector-chain and type-chain resolution.
//!
//! A call like `outer2.A.Do()` reaches its method through a chain of
//! selector expressions. [`ReceiverBinding`] resolves the chain down to the
//! root identifier (the receiver the call is ultimately performed through)
//! together with the statically resolved receiver type. [`TypeChain`] applies
//! the same walk to type expressions (`pkg.Iface`, `*T`) so a declared
//! parameter type can be rendered back to its declaring identifier.

use smallvec::SmallVec;
use tree_sitter::Node;

use crate::ast;
use crate::error::ResolveError;
use crate::oracle::{Selection, TypeOracle, TypeRef};

/// Upper bound on selector nesting. Chains follow strictly decreasing child
/// expressions, so this only trims degenerate machine-generated input.
const MAX_CHAIN_DEPTH: usize = 32;

// =============================================================================
// Selector chains
// =============================================================================

/// The identifiers of a chained member access, accumulated innermost-first.
///
/// For `outer2.A.Do()` the stored order is `[A, outer2]`; rendering reverses
/// it to read in calling order (`outer2.A`, the invoked member excluded).
/// Invariant: never empty once construction has succeeded — the root
/// identifier is always appended before resolution returns.
#[derive(Debug, Clone)]
pub struct SelectorChain<'t> {
    idents: SmallVec<[Node<'t>; 4]>,
}

impl<'t> SelectorChain<'t> {
    /// The root identifier the call is performed through (the last-appended
    /// chain element).
    #[must_use]
    pub fn receiver(&self) -> Node<'t> {
        *self
            .idents
            .last()
            .expect("selector chain is never empty after construction")
    }

    /// Number of identifiers in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.idents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.idents.is_empty()
    }

    /// Render the chain in calling order, e.g. `outer2.A`.
    #[must_use]
    pub fn render(&self, source: &str) -> String {
        let mut out = String::new();
        for ident in self.idents.iter().rev() {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(ast::node_text(source, *ident));
        }
        out
    }
}

/// A method call through a selector chain, with its resolved receiver type.
#[derive(Debug, Clone)]
pub struct ReceiverBinding<'t> {
    /// Access path to the receiver, invoked member excluded.
    pub chain: SelectorChain<'t>,
    /// Statically resolved type of the receiver at the innermost access.
    pub receiver_type: TypeRef,
    /// Name of the invoked member.
    pub member: String,
    /// Whether the member resolved to a method.
    pub is_method: bool,
}

impl<'t> ReceiverBinding<'t> {
    /// Resolve the function operand of a call expression.
    ///
    /// `sel` must be the `selector_expression` the call invokes through.
    /// The chain walk is purely syntactic and runs first, so excluded
    /// receiver shapes skip before any type lookup. Type resolution then
    /// happens exactly once, via the oracle's selection lookup for this
    /// outermost access node.
    pub fn resolve(
        sel: Node<'t>,
        oracle: &dyn TypeOracle,
    ) -> Result<ReceiverBinding<'t>, ResolveError> {
        let operand = ast::field(sel, "operand")
            .ok_or_else(|| ResolveError::UnexpectedExpr(sel.kind().to_string()))?;

        let mut idents = SmallVec::new();
        descend(operand, &mut idents, MAX_CHAIN_DEPTH)?;

        let Selection {
            receiver,
            member,
            is_method,
        } = oracle.selection(sel).ok_or(ResolveError::NoTypeInfo)?;

        Ok(ReceiverBinding {
            chain: SelectorChain { idents },
            receiver_type: receiver,
            member,
            is_method,
        })
    }
}

/// Walk the operand side of a selector, appending member identifiers
/// innermost-first and the root identifier last.
fn descend<'t>(
    expr: Node<'t>,
    idents: &mut SmallVec<[Node<'t>; 4]>,
    depth: usize,
) -> Result<(), ResolveError> {
    if depth == 0 {
        return Err(ResolveError::UnexpectedExpr(
            "selector nesting exceeds depth bound".to_string(),
        ));
    }
    match expr.kind() {
        // The receiver: record it as the final chain element.
        "identifier" | "field_identifier" => {
            idents.push(expr);
            Ok(())
        }
        "selector_expression" => {
            let member = ast::field(expr, "field")
                .ok_or_else(|| ResolveError::UnexpectedExpr(expr.kind().to_string()))?;
            idents.push(member);
            let operand = ast::field(expr, "operand")
                .ok_or_else(|| ResolveError::UnexpectedExpr(expr.kind().to_string()))?;
            descend(operand, idents, depth - 1)
        }
        // Calls through `arr[0].Do()` or `f().Do()` are excluded from
        // analysis rather than treated as errors.
        "index_expression" => Err(ResolveError::Skip("indexed receiver")),
        "call_expression" => Err(ResolveError::Skip("call-valued receiver")),
        kind => Err(ResolveError::UnexpectedExpr(kind.to_string())),
    }
}

// =============================================================================
// Type chains
// =============================================================================

/// The identifiers naming a type expression, declaring identifier last.
///
/// `mypkg.MyInterface` yields `[mypkg, MyInterface]`; `*T` unwraps one
/// pointer level and recurses.
#[derive(Debug, Clone)]
pub struct TypeChain<'t> {
    idents: SmallVec<[Node<'t>; 2]>,
}

impl<'t> TypeChain<'t> {
    /// Resolve a type expression into its identifier chain.
    pub fn resolve(ty: Node<'t>) -> Result<TypeChain<'t>, ResolveError> {
        let mut idents = SmallVec::new();
        collect_type(ty, &mut idents, MAX_CHAIN_DEPTH)?;
        Ok(TypeChain { idents })
    }

    /// The declaring identifier of the type (the final chain element).
    #[must_use]
    pub fn last(&self) -> Node<'t> {
        *self
            .idents
            .last()
            .expect("type chain is never empty after construction")
    }

    /// Render the chain as written, e.g. `mypkg.MyInterface`.
    #[must_use]
    pub fn render(&self, source: &str) -> String {
        let mut out = String::new();
        for ident in self.idents.iter() {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(ast::node_text(source, *ident));
        }
        out
    }
}

fn collect_type<'t>(
    ty: Node<'t>,
    idents: &mut SmallVec<[Node<'t>; 2]>,
    depth: usize,
) -> Result<(), ResolveError> {
    if depth == 0 {
        return Err(ResolveError::UnexpectedExpr(
            "type nesting exceeds depth bound".to_string(),
        ));
    }
    match ty.kind() {
        "type_identifier" | "identifier" => {
            idents.push(ty);
            Ok(())
        }
        "qualified_type" => {
            let package = ast::field(ty, "package")
                .ok_or_else(|| ResolveError::UnexpectedExpr(ty.kind().to_string()))?;
            let name = ast::field(ty, "name")
                .ok_or_else(|| ResolveError::UnexpectedExpr(ty.kind().to_string()))?;
            idents.push(package);
            idents.push(name);
            Ok(())
        }
        "pointer_type" => {
            let inner = ty
                .named_child(0)
                .ok_or_else(|| ResolveError::UnexpectedExpr(ty.kind().to_string()))?;
            collect_type(inner, idents, depth - 1)
        }
        "generic_type" => {
            let base = ast::field(ty, "type")
                .ok_or_else(|| ResolveError::UnexpectedExpr(ty.kind().to_string()))?;
            collect_type(base, idents, depth - 1)
        }
        kind => Err(ResolveError::UnexpectedExpr(kind.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast;
    use crate::oracle::{DefId, Selection, TypeOracle, TypeRef};
    use tree_sitter::{Parser, Tree};

    /// Oracle that answers a fixed selection for every selector.
    struct StubOracle;

    impl TypeOracle for StubOracle {
        fn selection(&self, _sel: Node<'_>) -> Option<Selection> {
            Some(Selection {
                receiver: TypeRef::new("main", "MyImpl"),
                member: "Do".to_string(),
                is_method: true,
            })
        }
        fn resolve_type(&self, _ty: Node<'_>) -> Option<TypeRef> {
            None
        }
        fn is_interface(&self, _ty: &TypeRef) -> bool {
            false
        }
        fn interface_methods(&self, _ty: &TypeRef) -> Option<Vec<String>> {
            None
        }
        fn implements(&self, _ty: &TypeRef, _iface: &TypeRef) -> bool {
            false
        }
        fn definition(&self, _ident: Node<'_>) -> Option<DefId> {
            None
        }
    }

    fn parse(source: &str) -> Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .expect("load Go grammar");
        parser.parse(source, None).expect("parse")
    }

    /// The function operand of the first call expression in the source.
    fn first_call_fun(tree: &Tree) -> Node<'_> {
        let mut fun = None;
        ast::walk(tree.root_node(), &mut |n| {
            if fun.is_none() && ast::is_call_expression(n) {
                fun = ast::field(n, "function");
                return false;
            }
            true
        });
        fun.expect("fixture contains a call")
    }

    #[test]
    fn test_single_receiver_chain() {
        let src = "package main\nfunc main() { outer.Do() }\n";
        let tree = parse(src);
        let binding = ReceiverBinding::resolve(first_call_fun(&tree), &StubOracle).unwrap();
        assert_eq!(binding.chain.len(), 1);
        assert_eq!(binding.chain.render(src), "outer");
        assert_eq!(ast::node_text(src, binding.chain.receiver()), "outer");
        assert_eq!(binding.member, "Do");
    }

    #[test]
    fn test_nested_chain_renders_in_calling_order() {
        let src = "package main\nfunc main() { outer3.B.A.Do() }\n";
        let tree = parse(src);
        let binding = ReceiverBinding::resolve(first_call_fun(&tree), &StubOracle).unwrap();
        assert_eq!(binding.chain.render(src), "outer3.B.A");
        // The root variable is the receiver, not the innermost field.
        assert_eq!(ast::node_text(src, binding.chain.receiver()), "outer3");
    }

    #[test]
    fn test_indexed_receiver_skips() {
        let src = "package main\nfunc main() { arr[0].Do() }\n";
        let tree = parse(src);
        let err = ReceiverBinding::resolve(first_call_fun(&tree), &StubOracle).unwrap_err();
        assert!(err.is_skip());
    }

    #[test]
    fn test_call_valued_receiver_skips() {
        let src = "package main\nfunc main() { get().Do() }\n";
        let tree = parse(src);
        let err = ReceiverBinding::resolve(first_call_fun(&tree), &StubOracle).unwrap_err();
        assert!(err.is_skip());
    }

    #[test]
    fn test_unexpected_receiver_shape_errors() {
        let src = "package main\nfunc main() { (<-ch).Do() }\n";
        let tree = parse(src);
        let err = ReceiverBinding::resolve(first_call_fun(&tree), &StubOracle).unwrap_err();
        assert!(matches!(err, ResolveError::UnexpectedExpr(_)));
    }

    fn first_param_type(tree: &Tree) -> Node<'_> {
        let mut ty = None;
        ast::walk(tree.root_node(), &mut |n| {
            if ty.is_none() && n.kind() == "parameter_declaration" {
                ty = ast::field(n, "type");
                return false;
            }
            true
        });
        ty.expect("fixture contains a parameter")
    }

    #[test]
    fn test_type_chain_bare_identifier() {
        let src = "package main\nfunc f(x MyImpl) {}\n";
        let tree = parse(src);
        let chain = TypeChain::resolve(first_param_type(&tree)).unwrap();
        assert_eq!(chain.render(src), "MyImpl");
        assert_eq!(ast::node_text(src, chain.last()), "MyImpl");
    }

    #[test]
    fn test_type_chain_qualified_and_pointer() {
        let src = "package main\nfunc f(x *mypkg.MyInterface) {}\n";
        let tree = parse(src);
        let chain = TypeChain::resolve(first_param_type(&tree)).unwrap();
        assert_eq!(chain.render(src), "mypkg.MyInterface");
        assert_eq!(ast::node_text(src, chain.last()), "MyInterface");
    }

    #[test]
    fn test_type_chain_rejects_func_types() {
        let src = "package main\nfunc f(x func()) {}\n";
        let tree = parse(src);
        let err = TypeChain::resolve(first_param_type(&tree)).unwrap_err();
        assert!(matches!(err, ResolveError::UnexpectedExpr(_)));
    }
}
