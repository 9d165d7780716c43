//! Table-driven finite-state machine engine.
//!
//! Every device FSM in this crate owns one [`Fsm`] and a context struct.
//! The engine knows nothing about the context: a [`Transition`] pairs an
//! origin and destination state with a guard predicate and an optional
//! action, both plain function pointers over the context. Tables are
//! fixed-length arrays built once at construction; the array length ends
//! the table, so no sentinel row is needed.
//!
//! ```text
//!   fire():  for t in table (in order):
//!              if t.origin == current && (t.guard)(ctx):
//!                  (t.action)(ctx); current = t.destination; return
//! ```
//!
//! First match wins. `fire` never blocks and never allocates.


use crate::error::Error;

/// State identifier used by a transition table.
pub trait FsmState: Copy + PartialEq {
    /// Human-readable name for logs and test diagnostics.
    fn name(&self) -> &'static str;
}

/// Predicate gating a transition. Reads the owning FSM's context.
pub type Guard<C> = fn(&C) -> bool;

/// Side effect run when a transition fires.
pub type Action<C> = fn(&mut C);

/// One row of a transition table.
pub struct Transition<S, C> {
    /// State the transition leaves from.
    pub origin: S,
    /// Input condition.
    pub guard: Guard<C>,
    /// State entered when the guard holds.
    pub destination: S,
    /// Output function, run before the state changes.
    pub action: Option<Action<C>>,
}

impl<S, C> Transition<S, C> {
    pub const fn new(origin: S, guard: Guard<C>, destination: S, action: Option<Action<C>>) -> Self {
        Self {
            origin,
            guard,
            destination,
            action,
        }
    }
}

// Function pointers are `Copy` whatever `C` is; derive would demand `C: Copy`.
impl<S: Copy, C> Clone for Transition<S, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Copy, C> Copy for Transition<S, C> {}

/// Generic dispatcher over a fixed table of `N` transitions.
pub struct Fsm<S, C, const N: usize> {
    current_state: S,
    table: [Transition<S, C>; N],
}

impl<S: FsmState, C, const N: usize> Fsm<S, C, N> {
    /// Build an engine starting in `initial_state`.
    ///
    /// Rejects an empty table and an initial state that the table never
    /// mentions.
    pub fn new(initial_state: S, table: [Transition<S, C>; N]) -> Result<Self, Error> {
        if N == 0 {
            return Err(Error::EmptyTransitionTable);
        }

        let known = table
            .iter()
            .any(|t| t.origin == initial_state || t.destination == initial_state);
        if !known {
            return Err(Error::UnknownInitialState);
        }

        Ok(Self {
            current_state: initial_state,
            table,
        })
    }

    /// Run one dispatch step against `ctx`.
    ///
    /// Returns `true` if a transition fired. When nothing matches the
    /// current state is left untouched.
    pub fn fire(&mut self, ctx: &mut C) -> bool {
        let current = self.current_state;
        let Some(transition) = self
            .table
            .iter()
            .find(|t| t.origin == current && (t.guard)(&*ctx))
            .copied()
        else {
            return false;
        };

        if let Some(action) = transition.action {
            action(ctx);
        }

        trace!(
            "fsm: {} -> {}",
            current.name(),
            transition.destination.name()
        );
        self.current_state = transition.destination;
        true
    }

    pub fn get_state(&self) -> S {
        self.current_state
    }

    /// Force the current state. Meant for tests and diagnostics; normal
    /// control flow only changes state through [`Fsm::fire`].
    pub fn set_state(&mut self, state: S) {
        self.current_state = state;
    }

    /// The whole table, in dispatch order.
    pub fn transitions(&self) -> &[Transition<S, C>] {
        &self.table
    }

    /// Outgoing transitions of `origin`, in dispatch order.
    pub fn transitions_from(&self, origin: S) -> impl Iterator<Item = &Transition<S, C>> + '_ {
        self.table.iter().filter(move |t| t.origin == origin)
    }
}
