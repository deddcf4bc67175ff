//! Callback parameter classification.
//!
//! Each parameter clause of a function literal declares one or more names
//! sharing a type. Classification resolves that type through the oracle,
//! unwraps one pointer level, and sorts the clause into an interface group
//! (carrying the interface's method set) or a concrete group. Clauses whose
//! type cannot be resolved are skipped individually; they never abort the
//! callback's analysis.

use tracing::debug;
use tree_sitter::Node;

use crate::ast;
use crate::chain::TypeChain;
use crate::oracle::{DefId, TypeOracle, TypeRef};

/// One bound parameter variable.
#[derive(Debug, Clone)]
pub struct ParamVar {
    /// Surface name of the variable.
    pub name: String,
    /// Declaration identity of the variable.
    pub def: Option<DefId>,
}

/// A parameter clause whose underlying type is an interface.
#[derive(Debug, Clone)]
pub struct InterfaceParam {
    /// Variables bound by the clause. Empty for unnamed parameters.
    pub vars: Vec<ParamVar>,
    /// Interface name as declared (unqualified).
    pub name: String,
    /// Resolved interface type.
    pub ty: TypeRef,
    /// The interface's method set, embedding expanded.
    pub methods: Vec<String>,
}

/// A parameter clause with a concrete (possibly pointer) type.
#[derive(Debug, Clone)]
pub struct ConcreteParam {
    /// Variables bound by the clause. Empty for unnamed parameters.
    pub vars: Vec<ParamVar>,
    /// Type name as declared (unqualified).
    pub name: String,
    /// Resolved type, one pointer level unwrapped.
    pub ty: TypeRef,
}

/// Classified parameters of one callback.
#[derive(Debug, Clone, Default)]
pub struct ParamGroups {
    pub interfaces: Vec<InterfaceParam>,
    pub concretes: Vec<ConcreteParam>,
}

impl ParamGroups {
    /// True when the callback declares nothing worth matching against.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.concretes.is_empty()
    }

    /// Whether any group's resolved type equals `ty` exactly.
    #[must_use]
    pub fn any_type_matches(&self, ty: &TypeRef) -> bool {
        self.interfaces.iter().any(|group| group.ty == *ty)
            || self.concretes.iter().any(|group| group.ty == *ty)
    }

    /// Whether the given receiver identifier denotes one of the callback's
    /// parameters, by surface name or by declaration identity. The two
    /// predicates are independent and either suffices: a parameter may
    /// shadow an outer variable of the same spelling.
    #[must_use]
    pub fn binds_receiver(&self, name: &str, def: Option<DefId>) -> bool {
        let all = self
            .interfaces
            .iter()
            .flat_map(|group| group.vars.iter())
            .chain(self.concretes.iter().flat_map(|group| group.vars.iter()));
        for var in all {
            if var.name == name {
                return true;
            }
            if let (Some(use_def), Some(var_def)) = (def, var.def) {
                if use_def == var_def {
                    return true;
                }
            }
        }
        false
    }
}

/// Classify the parameter list of a function literal.
pub fn classify<'t>(
    callback: Node<'t>,
    source: &str,
    oracle: &dyn TypeOracle,
) -> ParamGroups {
    let mut groups = ParamGroups::default();
    let Some(params) = ast::field(callback, "parameters") else {
        return groups;
    };

    for clause in ast::named_children(params) {
        match clause.kind() {
            "parameter_declaration" | "variadic_parameter_declaration" => {}
            _ => continue,
        }
        let Some(ty_node) = ast::field(clause, "type") else {
            continue;
        };

        // Declared identifier chain first: non-nominal types (func, map,
        // chan, struct literals) fall out here and are simply not matched.
        let chain = match TypeChain::resolve(ty_node) {
            Ok(chain) => chain,
            Err(err) => {
                debug!(kind = ty_node.kind(), %err, "skipping parameter clause");
                continue;
            }
        };
        let Some(resolved) = oracle.resolve_type(ty_node) else {
            debug!(
                ty = ast::node_text(source, ty_node),
                "no type information for parameter clause"
            );
            continue;
        };

        let vars: Vec<ParamVar> = ast::field_children(clause, "name")
            .into_iter()
            .map(|ident| ParamVar {
                name: ast::node_text(source, ident).to_string(),
                def: oracle.definition(ident),
            })
            .collect();

        let name = ast::node_text(source, chain.last()).to_string();
        let base = resolved.deref();
        if oracle.is_interface(&base) {
            let methods = oracle.interface_methods(&base).unwrap_or_default();
            groups.interfaces.push(InterfaceParam {
                vars,
                name,
                ty: base,
                methods,
            });
        } else {
            groups.concretes.push(ConcreteParam { vars, name, ty: base });
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast;
    use crate::driver::parse_source;
    use crate::index::PackageIndex;

    const FIXTURE: &str = r#"package main

type MyInterface interface {
	Do()
}

type MyImpl struct{}

func (m *MyImpl) Do() {}

func main() {
	run(func(a MyInterface, b, c *MyImpl, f func()) {
		a.Do()
	})
}
"#;

    fn first_func_literal(root: Node<'_>) -> Node<'_> {
        let mut lit = None;
        ast::walk(root, &mut |n| {
            if lit.is_none() && ast::is_func_literal(n) {
                lit = Some(n);
                return false;
            }
            true
        });
        lit.expect("fixture contains a function literal")
    }

    #[test]
    fn test_classification_splits_interface_and_concrete() {
        let file = parse_source("main.go", FIXTURE).unwrap();
        let files = [file];
        let index = PackageIndex::new(&files);
        let oracle = index.oracle_for(&files[0]);

        let groups = classify(
            first_func_literal(files[0].tree.root_node()),
            FIXTURE,
            &oracle,
        );

        assert_eq!(groups.interfaces.len(), 1);
        let iface = &groups.interfaces[0];
        assert_eq!(iface.name, "MyInterface");
        assert_eq!(iface.methods, vec!["Do".to_string()]);
        assert_eq!(iface.vars.len(), 1);
        assert_eq!(iface.vars[0].name, "a");

        // The func-typed clause is skipped; the pointer clause unwraps.
        assert_eq!(groups.concretes.len(), 1);
        let concrete = &groups.concretes[0];
        assert_eq!(concrete.name, "MyImpl");
        assert!(!concrete.ty.pointer);
        assert_eq!(
            concrete.vars.iter().map(|v| &v.name).collect::<Vec<_>>(),
            ["b", "c"]
        );
    }

    #[test]
    fn test_binds_receiver_by_name_without_identity() {
        let file = parse_source("main.go", FIXTURE).unwrap();
        let files = [file];
        let index = PackageIndex::new(&files);
        let oracle = index.oracle_for(&files[0]);
        let groups = classify(
            first_func_literal(files[0].tree.root_node()),
            FIXTURE,
            &oracle,
        );

        assert!(groups.binds_receiver("b", None));
        assert!(!groups.binds_receiver("outer", None));
    }
}
