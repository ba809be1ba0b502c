//! Deferred, context-dependent parameters.
//!
//! Most field parameters (formats, counts, predicates, discriminants) are
//! either known at definition time or computed from previously processed
//! fields. [`Expr`] holds both shapes behind one type: a stored literal, or
//! a pure function of the current [`Context`]. Deferred expressions are
//! evaluated on demand, every time — never cached across operations,
//! because one schema is reused across many records.

use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::errors::CodecError;

type EvalFn<T> = dyn Fn(&Context<'_, '_>) -> Result<T, CodecError>;

/// A literal `T`, or a deferred computation producing a `T` from the
/// evaluation context.
pub enum Expr<T> {
    Lit(T),
    Defer(Rc<EvalFn<T>>),
}

impl<T: Clone> Expr<T> {
    /// Wraps a literal value.
    pub fn lit(value: T) -> Self {
        Expr::Lit(value)
    }

    /// Wraps a deferred computation over the context.
    pub fn defer<F>(f: F) -> Self
    where
        F: Fn(&Context<'_, '_>) -> Result<T, CodecError> + 'static,
    {
        Expr::Defer(Rc::new(f))
    }

    /// Resolves the parameter: literals verbatim, deferred expressions
    /// against the current context.
    pub fn eval(&self, ctx: &Context<'_, '_>) -> Result<T, CodecError> {
        match self {
            Expr::Lit(v) => Ok(v.clone()),
            Expr::Defer(f) => f(ctx),
        }
    }

    /// The literal value, if this is not a deferred expression.
    pub fn literal(&self) -> Option<&T> {
        match self {
            Expr::Lit(v) => Some(v),
            Expr::Defer(_) => None,
        }
    }
}

impl<T: Clone> Clone for Expr<T> {
    fn clone(&self) -> Self {
        match self {
            Expr::Lit(v) => Expr::Lit(v.clone()),
            Expr::Defer(f) => Expr::Defer(Rc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Lit(v) => f.debug_tuple("Lit").field(v).finish(),
            Expr::Defer(_) => f.write_str("Defer(..)"),
        }
    }
}

impl<T> From<T> for Expr<T> {
    fn from(value: T) -> Self {
        Expr::Lit(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, Mode, Scope};
    use crate::schema::Config;
    use crate::value::Value;
    use std::io::Cursor;

    #[test]
    fn test_literal_and_deferred() {
        let mut cur = Cursor::new(Vec::new());
        let scope = Scope::new(&mut cur, Mode::Unpack);
        let mut ctx = Context::root(&scope, Config::default(), Default::default()).unwrap();
        ctx.set("n", Value::U64(4));

        let lit: Expr<u64> = 7u64.into();
        assert_eq!(lit.eval(&ctx).unwrap(), 7);
        assert_eq!(lit.literal(), Some(&7));

        let defer = Expr::defer(|ctx| Ok(ctx.get_u64("n")? * 2));
        assert_eq!(defer.eval(&ctx).unwrap(), 8);
        assert!(defer.literal().is_none());

        // re-evaluated every time, reflecting context changes
        ctx.set("n", Value::U64(10));
        assert_eq!(defer.eval(&ctx).unwrap(), 20);
    }
}
