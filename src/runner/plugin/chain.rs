//! Ordered resolver chains.
//!
//! A chain holds the resolvers for one capability in query order. Host
//! resolvers come first, in the order they were added; the default resolver,
//! if any, is pinned at the tail so that later registrations still take
//! priority over it.
//!
//! ```text
//! add_first(A)  add(B)  add(C)  set_default(D)
//!
//!   query order:  A -> B -> C -> D
//! ```
//!
//! Every mutation regenerates the chain's generation token, which the
//! resolution cache uses to discard entries recorded against an older chain.

use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};
use uuid::Uuid;

use crate::runner::ds::error::EvalError;
use crate::runner::ds::value::{Value, ValueType};
use crate::runner::plugin::resolver::{MethodExecutor, MethodResolver, PropertyResolver};
use crate::runner::plugin::types::EvalContext;

pub struct ResolverChain<R: ?Sized> {
    /// Host-registered resolvers, queried in order.
    resolvers: Vec<Rc<R>>,
    /// Queried after every host resolver.
    default: Option<Rc<R>>,
    generation: Uuid,
}

/// Outcome of a successful method resolution.
pub struct ResolvedMethod {
    /// Position of the accepting resolver in the chain.
    pub index: usize,
    pub resolver: String,
    pub executor: Box<dyn MethodExecutor>,
}

impl<R: ?Sized> ResolverChain<R> {
    pub fn new() -> Self {
        ResolverChain {
            resolvers: Vec::new(),
            default: None,
            generation: Uuid::new_v4(),
        }
    }

    fn touch(&mut self) {
        self.generation = Uuid::new_v4();
    }

    /// Token identifying the current membership and order of the chain.
    pub fn generation(&self) -> Uuid {
        self.generation
    }

    /// Append a resolver. It is queried after the resolvers added before it
    /// but ahead of the default resolver.
    pub fn add(&mut self, resolver: Rc<R>) {
        self.resolvers.push(resolver);
        self.touch();
    }

    /// Insert a resolver ahead of every other resolver.
    pub fn add_first(&mut self, resolver: Rc<R>) {
        self.resolvers.insert(0, resolver);
        self.touch();
    }

    /// Remove the first host resolver matching `pred`.
    pub fn remove_by(&mut self, pred: impl Fn(&R) -> bool) -> Option<Rc<R>> {
        let pos = self.resolvers.iter().position(|r| pred(&**r))?;
        self.touch();
        Some(self.resolvers.remove(pos))
    }

    pub fn set_default(&mut self, resolver: Option<Rc<R>>) {
        self.default = resolver;
        self.touch();
    }

    pub fn default_resolver(&self) -> Option<&Rc<R>> {
        self.default.as_ref()
    }

    /// Replace the whole chain with an explicit order. The default slot is
    /// cleared, so a default resolver that should remain must be included.
    pub fn replace_all(&mut self, resolvers: Vec<Rc<R>>) {
        self.resolvers = resolvers;
        self.default = None;
        self.touch();
    }

    /// Resolvers in query order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<R>> {
        self.resolvers.iter().chain(self.default.iter())
    }

    pub fn get(&self, index: usize) -> Option<&Rc<R>> {
        if index < self.resolvers.len() {
            self.resolvers.get(index)
        } else if index == self.resolvers.len() {
            self.default.as_ref()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.resolvers.len() + self.default.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Query resolvers in order and return the first one `query` accepts.
    ///
    /// `hint` is the index that accepted this access last time. It is tried
    /// first; if it declines, the full chain is scanned in order.
    fn first_match<T>(
        &self,
        hint: Option<usize>,
        mut query: impl FnMut(&R) -> Result<Option<T>, EvalError>,
    ) -> Result<Option<(usize, &R, T)>, EvalError> {
        if let Some(index) = hint {
            if let Some(resolver) = self.get(index) {
                if let Some(out) = query(&**resolver)? {
                    trace!(index, "cached resolver accepted");
                    return Ok(Some((index, &**resolver, out)));
                }
            }
        }
        for (index, resolver) in self.iter().enumerate() {
            if Some(index) == hint {
                continue;
            }
            if let Some(out) = query(&**resolver)? {
                return Ok(Some((index, &**resolver, out)));
            }
        }
        Ok(None)
    }
}

impl ResolverChain<dyn PropertyResolver> {
    /// Remove the host resolver registered under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Rc<dyn PropertyResolver>> {
        self.remove_by(|r| r.name() == name)
    }

    /// First resolver that can read `name` from `target`.
    pub fn find_reader(
        &self,
        ctx: &EvalContext,
        target: &Value,
        name: &str,
        hint: Option<usize>,
    ) -> Result<Option<(usize, &dyn PropertyResolver)>, EvalError> {
        let found = self.first_match(hint, |r| {
            r.can_read(ctx, target, name)
                .map(|ok| if ok { Some(()) } else { None })
                .map_err(|e| EvalError::from_access(r.name(), e))
        })?;
        Ok(found.map(|(index, resolver, _)| {
            debug!(resolver = resolver.name(), index, property = name, "property reader selected");
            (index, resolver)
        }))
    }

    /// First resolver that can write `name` on `target`.
    pub fn find_writer(
        &self,
        ctx: &EvalContext,
        target: &Value,
        name: &str,
        hint: Option<usize>,
    ) -> Result<Option<(usize, &dyn PropertyResolver)>, EvalError> {
        let found = self.first_match(hint, |r| {
            r.can_write(ctx, target, name)
                .map(|ok| if ok { Some(()) } else { None })
                .map_err(|e| EvalError::from_access(r.name(), e))
        })?;
        Ok(found.map(|(index, resolver, _)| {
            debug!(resolver = resolver.name(), index, property = name, "property writer selected");
            (index, resolver)
        }))
    }
}

impl ResolverChain<dyn MethodResolver> {
    /// Remove the host resolver registered under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Rc<dyn MethodResolver>> {
        self.remove_by(|r| r.name() == name)
    }

    /// Resolve `name` on `target` for arguments of `arg_types`.
    ///
    /// `Ok(None)` means no resolver in the chain accepted the call.
    pub fn resolve(
        &self,
        ctx: &EvalContext,
        target: &Value,
        name: &str,
        arg_types: &[ValueType],
        hint: Option<usize>,
    ) -> Result<Option<ResolvedMethod>, EvalError> {
        let found = self.first_match(hint, |r| {
            r.resolve(ctx, target, name, arg_types)
                .map_err(|e| EvalError::from_access(r.name(), e))
        })?;
        Ok(found.map(|(index, resolver, executor)| {
            debug!(resolver = resolver.name(), index, method = name, "method executor selected");
            ResolvedMethod {
                index,
                resolver: resolver.name().to_string(),
                executor,
            }
        }))
    }
}

impl<R: ?Sized> Default for ResolverChain<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ?Sized> Clone for ResolverChain<R> {
    fn clone(&self) -> Self {
        ResolverChain {
            resolvers: self.resolvers.clone(),
            default: self.default.clone(),
            generation: self.generation,
        }
    }
}

impl<R: ?Sized> fmt::Debug for ResolverChain<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverChain")
            .field("resolvers", &self.resolvers.len())
            .field("has_default", &self.default.is_some())
            .field("generation", &self.generation)
            .finish()
    }
}
