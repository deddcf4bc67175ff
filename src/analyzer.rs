//! The capture analysis itself.
//!
//! For every call expression carrying a function-literal callback, the
//! analyzer classifies the callback's parameters, walks the callback body
//! collecting method calls made through selector chains, and reports the
//! calls whose receiver is an outer variable that the callback almost
//! certainly meant to reach through a parameter: the receiver's type
//! satisfies an interface parameter, is identical to a concrete parameter
//! type, or equals the receiver type of the enclosing call.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use tree_sitter::Node;

use crate::ast;
use crate::chain::ReceiverBinding;
use crate::config::Config;
use crate::error::Result;
use crate::oracle::{TypeOracle, TypeRef};
use crate::params::{self, ParamGroups};

/// Analyzer identifier, as registered with a host driver.
pub const NAME: &str = "capcheck";

/// Human-readable description of the analyzer.
pub const DOC: &str = "checks for possibly unintentional captures of variables \
implementing an interface of a parameter in a callback function";

/// Pre-passes this analyzer depends on.
pub const REQUIRES: &[&str] = &["inspect"];

// =============================================================================
// Findings
// =============================================================================

/// Source position of a finding, 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Location {
    #[must_use]
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// What kind of capture was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// The receiver implements an interface declared as a parameter.
    Interface,
    /// The receiver has the same concrete type as a parameter.
    Concrete,
    /// The receiver has the enclosing call's receiver type and was reached
    /// directly instead of through a parameter.
    ReceiverType,
}

/// One confirmed false-capture call.
///
/// Positioned at the receiver identifier, not the call expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub location: Location,
    /// The captured access chain, e.g. `outer2.A`.
    pub chain: String,
    /// Description of the matched parameter (interface name, parameter
    /// variable name, or receiver type name).
    pub parameter: String,
    pub message: String,
}

impl Finding {
    fn interface(location: Location, chain: String, iface: String) -> Self {
        let message = format!("captured variable {chain} implements interface {iface}");
        Self {
            kind: FindingKind::Interface,
            location,
            chain,
            parameter: iface,
            message,
        }
    }

    fn concrete(location: Location, chain: String, param: String) -> Self {
        let message = format!("captured variable {chain} is of same type as parameter {param}");
        Self {
            kind: FindingKind::Concrete,
            location,
            chain,
            parameter: param,
            message,
        }
    }

    fn receiver_type(location: Location, chain: String, receiver: String) -> Self {
        let message = format!("method call on receiver type {chain} not through parameter");
        Self {
            kind: FindingKind::ReceiverType,
            location,
            chain,
            parameter: receiver,
            message,
        }
    }
}

// =============================================================================
// Entry point
// =============================================================================

/// Everything the analyzer needs for one file.
pub struct AnalysisContext<'a> {
    /// Path of the file under analysis.
    pub file: &'a Path,
    /// Source text of the file.
    pub source: &'a str,
    /// Root node of the parsed file.
    pub root: Node<'a>,
    /// Package the file declares.
    pub package: &'a str,
    /// Type oracle for this file.
    pub oracle: &'a dyn TypeOracle,
    /// Run configuration.
    pub config: &'a Config,
}

/// Run the analysis over one file, returning its findings.
pub fn run(ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    ast::walk(ctx.root, &mut |node| {
        if !ast::is_call_expression(node) {
            return true;
        }
        let Some(callback) = callback_literal(node) else {
            return true;
        };
        debug!(
            fun = ast::node_text(ctx.source, ast::field(node, "function").unwrap_or(node)),
            "examining call with callback"
        );
        check_callback(ctx, node, callback, &mut findings);
        // The callback has been handled in full, body included.
        false
    });
    Ok(findings)
}

/// The function-literal argument of a call, if any. The first argument is
/// preferred; callbacks conventionally passed last are picked up as a
/// fallback.
fn callback_literal(call: Node<'_>) -> Option<Node<'_>> {
    let args = ast::field(call, "arguments")?;
    let args = ast::named_children(args);
    let first = *args.first()?;
    if ast::is_func_literal(first) {
        return Some(first);
    }
    let last = *args.last()?;
    if ast::is_func_literal(last) {
        return Some(last);
    }
    None
}

// =============================================================================
// Per-callback analysis
// =============================================================================

/// The enclosing call's receiver, when the callback is passed to a method
/// invoked through a selector (`a.b.Method(cb)`).
struct EnclosingReceiver {
    ty: TypeRef,
}

fn enclosing_receiver(ctx: &AnalysisContext<'_>, call: Node<'_>) -> Option<EnclosingReceiver> {
    let fun = ast::field(call, "function")?;
    if fun.kind() != "selector_expression" {
        return None;
    }
    let selection = ctx.oracle.selection(fun)?;
    Some(EnclosingReceiver {
        ty: selection.receiver,
    })
}

fn check_callback(
    ctx: &AnalysisContext<'_>,
    call: Node<'_>,
    callback: Node<'_>,
    findings: &mut Vec<Finding>,
) {
    let groups = params::classify(callback, ctx.source, ctx.oracle);
    if groups.is_empty() {
        trace!("no interface or concrete types in param list");
        return;
    }

    // The secondary check fires only when some parameter has the same type
    // as the value the enclosing method was invoked on.
    let secondary = enclosing_receiver(ctx, call).filter(|enc| groups.any_type_matches(&enc.ty));

    let Some(body) = ast::field(callback, "body") else {
        return;
    };

    for binding in collect_bindings(ctx.source, ctx.oracle, body) {
        match_binding(ctx, &groups, secondary.as_ref(), &binding, findings);
    }
}

/// Every method call in the body made through a selector chain, with its
/// receiver type resolved. Skipped shapes are dropped silently; resolution
/// failures are dropped after logging.
fn collect_bindings<'t>(
    source: &str,
    oracle: &dyn TypeOracle,
    body: Node<'t>,
) -> Vec<ReceiverBinding<'t>> {
    let mut bindings = Vec::new();
    ast::walk(body, &mut |node| {
        if !ast::is_call_expression(node) {
            return true;
        }
        let Some(fun) = ast::field(node, "function") else {
            return true;
        };
        if fun.kind() != "selector_expression" {
            return true;
        }
        match ReceiverBinding::resolve(fun, oracle) {
            Ok(binding) => bindings.push(binding),
            Err(err) if err.is_skip() => {
                trace!(call = ast::node_text(source, fun), %err, "receiver excluded");
            }
            Err(err) => {
                debug!(call = ast::node_text(source, fun), %err, "receiver not resolved");
            }
        }
        true
    });
    bindings
}

fn match_binding(
    ctx: &AnalysisContext<'_>,
    groups: &ParamGroups,
    secondary: Option<&EnclosingReceiver>,
    binding: &ReceiverBinding<'_>,
    findings: &mut Vec<Finding>,
) {
    let receiver = binding.chain.receiver();
    let receiver_name = ast::node_text(ctx.source, receiver);
    let receiver_def = ctx.oracle.definition(receiver);
    let (line, column) = ast::position(receiver);
    let location = Location::new(ctx.file.display().to_string(), line, column);
    let chain = binding.chain.render(ctx.source);

    trace!(%chain, ty = %binding.receiver_type, "examining captured call");

    // A call on the enclosing receiver's own type that bypassed the
    // parameter is reported as such, in place of any interface or concrete
    // finding for the same call.
    if let Some(enc) = secondary {
        if binding.receiver_type == enc.ty && !groups.binds_receiver(receiver_name, receiver_def) {
            findings.push(Finding::receiver_type(
                location,
                chain,
                enc.ty.display_from(ctx.package),
            ));
            return;
        }
    }

    for group in &groups.interfaces {
        if group.vars.iter().any(|var| {
            var.name == receiver_name
                || matches!((receiver_def, var.def), (Some(a), Some(b)) if a == b)
        }) {
            trace!(%chain, "receiver is the parameter");
            continue;
        }
        if !ctx.config.should_check_interface(&group.name) {
            continue;
        }
        // Some receivers are recorded in value form even though only the
        // pointer form carries the method set; retry as a pointer when the
        // direct check fails.
        let satisfied = ctx.oracle.implements(&binding.receiver_type, &group.ty)
            || ctx
                .oracle
                .implements(&binding.receiver_type.as_pointer(), &group.ty);
        if !satisfied {
            continue;
        }
        // The invoked member must belong to this interface's method set;
        // a call reaching an unrelated embedded method is not a capture of
        // this parameter.
        if !group.methods.iter().any(|m| *m == binding.member) {
            trace!(%chain, member = %binding.member, "member not in interface method set");
            continue;
        }
        findings.push(Finding::interface(
            location.clone(),
            chain.clone(),
            group.ty.display_from(ctx.package),
        ));
    }

    for group in &groups.concretes {
        if group.vars.iter().any(|var| {
            var.name == receiver_name
                || matches!((receiver_def, var.def), (Some(a), Some(b)) if a == b)
        }) {
            continue;
        }
        if binding.receiver_type == group.ty {
            let param = group
                .vars
                .first()
                .map(|var| var.name.clone())
                .unwrap_or_else(|| group.name.clone());
            findings.push(Finding::concrete(location.clone(), chain.clone(), param));
        }
    }
}
