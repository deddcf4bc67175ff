//! The type-oracle boundary between the engine and its host.
//!
//! The capture engine never resolves types itself; it asks an implementation
//! of [`TypeOracle`] for selection information, declared types, interface
//! method sets, and declaration identities. The oracle shipped with this
//! crate is [`crate::index::PackageIndex`], built from the parsed files
//! themselves; a host with richer type information can substitute its own.

use serde::Serialize;
use tree_sitter::Node;

/// A resolved reference to a named Go type.
///
/// The package is always concrete (unqualified names resolve to the package
/// of the file they appear in). Equality is exact: two references match only
/// if package, name, and pointer-ness all agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeRef {
    /// Declaring package name.
    pub package: String,
    /// Type name within the package.
    pub name: String,
    /// True for `*T`.
    pub pointer: bool,
}

impl TypeRef {
    /// Create a non-pointer reference.
    #[must_use]
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            pointer: false,
        }
    }

    /// The same type in pointer form.
    #[must_use]
    pub fn as_pointer(&self) -> Self {
        Self {
            package: self.package.clone(),
            name: self.name.clone(),
            pointer: true,
        }
    }

    /// The same type with one pointer level removed.
    #[must_use]
    pub fn deref(&self) -> Self {
        Self {
            package: self.package.clone(),
            name: self.name.clone(),
            pointer: false,
        }
    }

    /// Render the name, package-qualified when the declaring package
    /// differs from `current_package`.
    #[must_use]
    pub fn display_from(&self, current_package: &str) -> String {
        if self.package == current_package {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.pointer {
            write!(f, "*")?;
        }
        write!(f, "{}.{}", self.package, self.name)
    }
}

/// Oracle answer for a member access `recv.Member`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Statically resolved type of the receiver expression.
    pub receiver: TypeRef,
    /// Name of the accessed member.
    pub member: String,
    /// True when the member is a method rather than a field.
    pub is_method: bool,
}

/// Opaque identity of a declaration. Two identifier uses with the same
/// `DefId` denote the same variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefId(pub usize);

/// Static type information supplied by the host.
///
/// All methods answer `None`/`false` rather than guessing; the engine
/// treats missing information as a reason to skip a call, never to report.
pub trait TypeOracle {
    /// Selection information for a `selector_expression` node: the
    /// receiver's type and the accessed member.
    fn selection(&self, sel: Node<'_>) -> Option<Selection>;

    /// Resolve a type expression (`type_identifier`, `qualified_type`, or
    /// `pointer_type` of either) to a named type reference.
    fn resolve_type(&self, ty: Node<'_>) -> Option<TypeRef>;

    /// Whether the named type is an interface.
    fn is_interface(&self, ty: &TypeRef) -> bool;

    /// The interface's method set, embedding expanded. `None` when the type
    /// is unknown or not an interface.
    fn interface_methods(&self, ty: &TypeRef) -> Option<Vec<String>>;

    /// Whether `ty` satisfies the interface `iface`.
    fn implements(&self, ty: &TypeRef, iface: &TypeRef) -> bool;

    /// Declaration identity for an identifier use (or for a defining
    /// occurrence, itself).
    fn definition(&self, ident: Node<'_>) -> Option<DefId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_equality_is_exact() {
        let value = TypeRef::new("main", "MyImpl");
        let pointer = value.as_pointer();
        assert_ne!(value, pointer);
        assert_eq!(value, pointer.deref());
        assert_ne!(value, TypeRef::new("mypkg", "MyImpl"));
    }

    #[test]
    fn test_display_qualifies_foreign_packages_only() {
        let iface = TypeRef::new("mypkg", "MyInterface");
        assert_eq!(iface.display_from("main"), "mypkg.MyInterface");
        assert_eq!(iface.display_from("mypkg"), "MyInterface");
    }
}
