//! Identifier Allocator
//!
//! Synthesizes temporaries (`_a`, `_b`, ..., `_0`, `_1`, ...) that do not
//! collide with anything bound in the enclosing declaration scope. The scope
//! itself belongs to the surrounding compiler and is only consulted through
//! the [`NameResolver`] capability.
//!
//! Names that must stay unique across every function lowered in a
//! compilation (renamed catch bindings, for instance) are additionally
//! registered in a [`GlobalNames`] registry shared by all allocators of the
//! session.

use crate::ir::IRNode;
use dashmap::DashSet;
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Opaque handle to a declaration scope of the surrounding compiler.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// "Is this name already bound in this scope?" capability supplied by the
/// binder.
pub trait NameResolver {
    fn is_name_bound(&self, scope: ScopeId, name: &str) -> bool;
}

impl<F> NameResolver for F
where
    F: Fn(ScopeId, &str) -> bool,
{
    fn is_name_bound(&self, scope: ScopeId, name: &str) -> bool {
        self(scope, name)
    }
}

/// Session-wide registry of names that no lowering may reuse.
///
/// Cloning shares the underlying set.
#[derive(Clone, Debug, Default)]
pub struct GlobalNames(Arc<DashSet<String>>);

impl GlobalNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`; returns false if it was already registered.
    pub fn register(&self, name: &str) -> bool {
        self.0.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Temp name for counter value `count`: `_a`..`_h`, `_j`..`_z`, then `_0`, `_1`, ...
///
/// `i` is skipped so that generated names never read as the conventional loop index.
pub fn temp_name(count: u32) -> String {
    if count < 25 {
        let offset = if count < 8 { count } else { count + 1 };
        let ch = char::from(b'a' + offset as u8);
        format!("_{ch}")
    } else {
        format!("_{}", count - 25)
    }
}

/// Per-function naming context.
pub struct Locals<'a> {
    resolver: &'a dyn NameResolver,
    scope: ScopeId,
    globals: GlobalNames,
    temp_count: u32,
    /// Every name this allocator has handed out
    issued: FxHashSet<String>,
    /// Locals to hoist into the outer function's `var` declaration, in order
    variables: Vec<String>,
}

impl<'a> Locals<'a> {
    pub fn new(resolver: &'a dyn NameResolver, scope: ScopeId, globals: GlobalNames) -> Self {
        Self {
            resolver,
            scope,
            globals,
            temp_count: 0,
            issued: FxHashSet::default(),
            variables: Vec::new(),
        }
    }

    pub const fn scope(&self) -> ScopeId {
        self.scope
    }

    pub const fn globals(&self) -> &GlobalNames {
        &self.globals
    }

    fn is_available(&self, name: &str) -> bool {
        !self.issued.contains(name)
            && !self.globals.contains(name)
            && !self.resolver.is_name_bound(self.scope, name)
    }

    /// Take `name` if it is free. A globally unique name is only taken when
    /// this allocator wins the registry insert, so concurrent allocators
    /// never both claim it.
    fn try_claim(&self, name: &str, globally_unique: bool) -> bool {
        self.is_available(name) && (!globally_unique || self.globals.register(name))
    }

    /// Produce a name that is free in this scope.
    ///
    /// `preferred` is used verbatim when available; otherwise candidates from
    /// [`temp_name`] are tried in order. The counter advances on every
    /// candidate, so a later call never retries one an earlier call consumed.
    pub fn create_unique_identifier(
        &mut self,
        preferred: Option<&str>,
        globally_unique: bool,
    ) -> String {
        let name = match preferred {
            Some(name) if self.try_claim(name, globally_unique) => name.to_string(),
            _ => loop {
                let candidate = temp_name(self.temp_count);
                self.temp_count += 1;
                if self.try_claim(&candidate, globally_unique) {
                    break candidate;
                }
            },
        };

        self.issued.insert(name.clone());
        tracing::trace!(name = %name, globally_unique, "allocated identifier");
        name
    }

    /// Record `name` as a local to hoist.
    pub fn record_variable(&mut self, name: impl Into<String>) {
        self.variables.push(name.into());
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Return `expression` if it is already an identifier; otherwise store it
    /// in a fresh temp through `write_assignment` and return the temp.
    pub fn ensure_identifier(
        &mut self,
        expression: IRNode,
        write_assignment: &mut dyn FnMut(IRNode, IRNode),
    ) -> IRNode {
        if matches!(expression.unlocated(), IRNode::Identifier(_)) {
            return expression;
        }
        let local = self.create_unique_identifier(None, false);
        self.record_variable(local.clone());
        write_assignment(IRNode::id(local.clone()), expression);
        IRNode::id(local)
    }

    /// `value === void 0 ? default_value : value`, evaluating `value` once.
    pub fn value_or_default(
        &mut self,
        value: IRNode,
        default_value: IRNode,
        write_assignment: &mut dyn FnMut(IRNode, IRNode),
    ) -> IRNode {
        let value = self.ensure_identifier(value, write_assignment);
        let is_undefined = IRNode::binary(value.clone(), "===", IRNode::void_0());
        IRNode::conditional(is_undefined, default_value, value)
    }
}

impl std::fmt::Debug for Locals<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locals")
            .field("scope", &self.scope)
            .field("temp_count", &self.temp_count)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/locals.rs"]
mod tests;
