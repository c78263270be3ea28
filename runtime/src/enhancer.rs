//! Store enhancers.
//!
//! An enhancer wraps the function that creates a store. It receives the
//! creator below it and returns a creator with the same signature, so
//! enhancers nest: `compose([f, g, h])` applies `h` first and leaves `f`
//! outermost.
//!
//! # Example
//!
//! ```
//! use unistore_core::reducer::from_fn;
//! use unistore_runtime::{BoxedEnhancer, StoreCreator, compose, create_store_with};
//! use serde_json::Value;
//!
//! // Double every preloaded value before the store sees it.
//! let doubling = |create: StoreCreator<i32, Value>| -> StoreCreator<i32, Value> {
//!     Box::new(move |reducer, preloaded| create(reducer, preloaded.map(|n| n * 2)))
//! };
//!
//! let reducer = from_fn(|s: Option<&i32>, _: &Value| s.copied().unwrap_or(0));
//! let enhancers: Vec<BoxedEnhancer<i32, Value>> = vec![Box::new(doubling)];
//! let store = create_store_with(reducer, Some(5), compose(enhancers))?;
//! assert_eq!(*store.get_state(), 10);
//! # Ok::<(), unistore_runtime::StoreError>(())
//! ```

use crate::error::StoreError;
use crate::store::Store;
use unistore_core::BoxedReducer;

/// A store-construction function: reducer and optional preloaded state in,
/// store out.
pub type StoreCreator<S, A> =
    Box<dyn FnOnce(BoxedReducer<S, A>, Option<S>) -> Result<Store<S, A>, StoreError>>;

/// A type-erased enhancer.
pub type BoxedEnhancer<S, A> = Box<dyn FnOnce(StoreCreator<S, A>) -> StoreCreator<S, A>>;

/// Wraps store construction.
///
/// Implemented for every `FnOnce(StoreCreator) -> StoreCreator`, so plain
/// closures are enhancers.
pub trait Enhancer<S, A> {
    /// Wrap `create`, returning a creator with the same contract.
    fn enhance(self, create: StoreCreator<S, A>) -> StoreCreator<S, A>;
}

impl<S, A, F> Enhancer<S, A> for F
where
    F: FnOnce(StoreCreator<S, A>) -> StoreCreator<S, A>,
{
    fn enhance(self, create: StoreCreator<S, A>) -> StoreCreator<S, A> {
        self(create)
    }
}

/// Erase an enhancer's type.
pub fn boxed<S, A, E>(enhancer: E) -> BoxedEnhancer<S, A>
where
    E: Enhancer<S, A> + 'static,
{
    Box::new(move |create| enhancer.enhance(create))
}

/// Compose enhancers right to left; the first one ends up outermost.
#[must_use]
pub fn compose<S, A>(enhancers: Vec<BoxedEnhancer<S, A>>) -> Composed<S, A> {
    Composed { enhancers }
}

/// Several enhancers applied as one.
///
/// Created by [`compose`].
pub struct Composed<S, A> {
    enhancers: Vec<BoxedEnhancer<S, A>>,
}

impl<S, A> Enhancer<S, A> for Composed<S, A> {
    fn enhance(self, create: StoreCreator<S, A>) -> StoreCreator<S, A> {
        self.enhancers
            .into_iter()
            .rev()
            .fold(create, |create, enhancer| enhancer(create))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::store::create_store_with;
    use std::cell::RefCell;
    use std::rc::Rc;
    use unistore_core::reducer::from_fn;
    use unistore_core::{Action, Reducer};

    #[derive(Debug, Clone)]
    enum Op {
        Init,
        Push(&'static str),
    }

    impl Action for Op {
        fn init() -> Self {
            Self::Init
        }

        fn is_init(&self) -> bool {
            matches!(self, Self::Init)
        }
    }

    fn log_reducer() -> impl Reducer<State = Vec<&'static str>, Action = Op> {
        from_fn(|state: Option<&Vec<&'static str>>, op: &Op| {
            let mut log = state.cloned().unwrap_or_default();
            if let Op::Push(entry) = op {
                log.push(*entry);
            }
            log
        })
    }

    /// Enhancer that records its name when the creator it built is called.
    fn tracking(
        name: &'static str,
        order: &Rc<RefCell<Vec<&'static str>>>,
    ) -> BoxedEnhancer<Vec<&'static str>, Op> {
        let order = Rc::clone(order);
        Box::new(move |create: StoreCreator<Vec<&'static str>, Op>| -> StoreCreator<Vec<&'static str>, Op> {
            Box::new(move |reducer, preloaded| {
                order.borrow_mut().push(name);
                create(reducer, preloaded)
            })
        })
    }

    #[test]
    fn test_closure_is_an_enhancer() {
        let seen_preloaded = Rc::new(RefCell::new(None));
        let seen = Rc::clone(&seen_preloaded);

        let enhancer = move |create: StoreCreator<Vec<&'static str>, Op>| -> StoreCreator<Vec<&'static str>, Op> {
            Box::new(move |reducer, preloaded: Option<Vec<&'static str>>| {
                *seen.borrow_mut() = preloaded.clone();
                create(reducer, preloaded)
            })
        };

        let store = create_store_with(log_reducer(), Some(vec!["boot"]), enhancer).unwrap();
        assert_eq!(*store.get_state(), vec!["boot"]);
        assert_eq!(*seen_preloaded.borrow(), Some(vec!["boot"]));
    }

    #[test]
    fn test_enhancer_can_replace_the_reducer() {
        let enhancer = |create: StoreCreator<Vec<&'static str>, Op>| -> StoreCreator<Vec<&'static str>, Op> {
            Box::new(move |_reducer, preloaded| {
                let reversed = from_fn(|state: Option<&Vec<&'static str>>, op: &Op| {
                    let mut log = state.cloned().unwrap_or_default();
                    if let Op::Push(entry) = op {
                        log.insert(0, *entry);
                    }
                    log
                });
                create(Box::new(reversed), preloaded)
            })
        };

        let store = create_store_with(log_reducer(), None, enhancer).unwrap();
        store.dispatch(Op::Push("a")).unwrap();
        store.dispatch(Op::Push("b")).unwrap();
        assert_eq!(*store.get_state(), vec!["b", "a"]);
    }

    #[test]
    fn test_compose_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let composed = compose(vec![
            tracking("outer", &order),
            tracking("middle", &order),
            tracking("inner", &order),
        ]);

        let store = create_store_with(log_reducer(), None, composed).unwrap();
        assert!(store.get_state().is_empty());
        assert_eq!(*order.borrow(), vec!["outer", "middle", "inner"]);
    }

    #[test]
    fn test_empty_compose_is_identity() {
        let store = create_store_with(log_reducer(), Some(vec!["x"]), compose(Vec::new())).unwrap();
        assert_eq!(*store.get_state(), vec!["x"]);
    }
}
