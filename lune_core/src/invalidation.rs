// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-flag bookkeeping and synchronous signal dispatch.

extern crate alloc;

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;

use crate::consistency::{ConsistencyState, Signal, SignalEvent};

/// Handle returned by [`Consistency::listen_signals`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerKey(u32);

type Listener = Box<dyn FnMut(&SignalEvent)>;

/// Dirty flags plus a signal channel for one component.
///
/// Listeners run synchronously, in registration order, inside [`Consistency::dispatch_signal`].
/// Every dispatched signal is also accumulated into a pending set that the owner of this
/// component can drain with [`Consistency::take_signals`].
pub struct Consistency {
    supported_states: ConsistencyState,
    supported_signals: Signal,
    state: ConsistencyState,
    suspension_level: u32,
    suspended: Option<Signal>,
    pending: Signal,
    listeners: Vec<(ListenerKey, Listener)>,
    next_key: u32,
}

impl fmt::Debug for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consistency")
            .field("state", &self.state)
            .field("supported_states", &self.supported_states)
            .field("supported_signals", &self.supported_signals)
            .field("suspension_level", &self.suspension_level)
            .field("pending", &self.pending)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Consistency {
    /// Creates a component with every supported state initially dirty.
    pub fn new(supported_states: ConsistencyState, supported_signals: Signal) -> Self {
        Self {
            supported_states,
            supported_signals,
            state: supported_states,
            suspension_level: 0,
            suspended: None,
            pending: Signal::NONE,
            listeners: Vec::new(),
            next_key: 0,
        }
    }

    /// Supported consistency states.
    pub fn supported_states(&self) -> ConsistencyState {
        self.supported_states
    }

    /// Supported signals.
    pub fn supported_signals(&self) -> Signal {
        self.supported_signals
    }

    /// Currently dirty states.
    pub fn state(&self) -> ConsistencyState {
        self.state
    }

    /// Marks `state` dirty and dispatches `signal` if anything newly became dirty.
    ///
    /// Bits outside the supported set are ignored. Returns the newly dirtied bits.
    pub fn invalidate(&mut self, state: ConsistencyState, signal: Signal) -> ConsistencyState {
        let effective = (state & self.supported_states).difference(self.state);
        self.state |= effective;
        if !effective.is_empty() {
            self.dispatch_signal(signal);
        }
        effective
    }

    /// Clears `state`.
    pub fn mark_consistent(&mut self, state: ConsistencyState) {
        self.state = self.state.difference(state);
    }

    /// Whether any bit of `state` is dirty.
    pub fn has_invalidation_state(&self, state: ConsistencyState) -> bool {
        self.state.intersects(state)
    }

    /// Whether nothing is dirty.
    pub fn is_consistent(&self) -> bool {
        self.state.is_empty()
    }

    /// Sends `signal` to listeners, or accumulates it while suspended.
    ///
    /// Unsupported bits are dropped. Nothing is sent for an empty signal.
    pub fn dispatch_signal(&mut self, signal: Signal) {
        let signal = signal & self.supported_signals;
        if signal.is_empty() {
            return;
        }
        if self.suspension_level > 0 {
            let acc = self.suspended.get_or_insert(Signal::NONE);
            *acc |= signal;
            return;
        }
        log::debug!(
            "dispatching {signal:?} to {} listener(s)",
            self.listeners.len()
        );
        let event = SignalEvent { signal };
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
        self.pending |= signal;
    }

    /// Starts accumulating signals instead of sending them. Nestable.
    pub fn suspend_signals(&mut self) {
        self.suspension_level += 1;
    }

    /// Ends one level of suspension.
    ///
    /// When the outermost level ends and `dispatch` is set, the accumulated signals are sent as
    /// one event. Otherwise they are discarded.
    pub fn resume_signals(&mut self, dispatch: bool) {
        if self.suspension_level == 0 {
            log::warn!("resume_signals called without a matching suspend_signals");
            return;
        }
        self.suspension_level -= 1;
        if self.suspension_level > 0 {
            return;
        }
        if let Some(signal) = self.suspended.take() {
            if dispatch {
                self.dispatch_signal(signal);
            }
        }
    }

    /// Whether signals are currently being accumulated.
    pub fn is_suspended(&self) -> bool {
        self.suspension_level > 0
    }

    /// Registers a listener that runs for every dispatched signal.
    pub fn listen_signals(&mut self, listener: impl FnMut(&SignalEvent) + 'static) -> ListenerKey {
        let key = ListenerKey(self.next_key);
        self.next_key += 1;
        self.listeners.push((key, Box::new(listener)));
        key
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unlisten_signals(&mut self, key: ListenerKey) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(k, _)| *k != key);
        self.listeners.len() != before
    }

    /// Drains the signals dispatched since the last call.
    pub fn take_signals(&mut self) -> Signal {
        core::mem::take(&mut self.pending)
    }
}

/// Components that own a [`Consistency`].
pub trait Invalidatable {
    /// Shared access to the component's bookkeeping.
    fn consistency(&self) -> &Consistency;

    /// Mutable access to the component's bookkeeping.
    fn consistency_mut(&mut self) -> &mut Consistency;

    /// See [`Consistency::invalidate`].
    fn invalidate(&mut self, state: ConsistencyState, signal: Signal) -> ConsistencyState {
        self.consistency_mut().invalidate(state, signal)
    }

    /// See [`Consistency::mark_consistent`].
    fn mark_consistent(&mut self, state: ConsistencyState) {
        self.consistency_mut().mark_consistent(state);
    }

    /// See [`Consistency::has_invalidation_state`].
    fn has_invalidation_state(&self, state: ConsistencyState) -> bool {
        self.consistency().has_invalidation_state(state)
    }

    /// See [`Consistency::is_consistent`].
    fn is_consistent(&self) -> bool {
        self.consistency().is_consistent()
    }

    /// See [`Consistency::suspend_signals`].
    fn suspend_signals(&mut self) {
        self.consistency_mut().suspend_signals();
    }

    /// See [`Consistency::resume_signals`].
    fn resume_signals(&mut self, dispatch: bool) {
        self.consistency_mut().resume_signals(dispatch);
    }

    /// See [`Consistency::listen_signals`].
    fn listen_signals(&mut self, listener: impl FnMut(&SignalEvent) + 'static) -> ListenerKey
    where
        Self: Sized,
    {
        self.consistency_mut().listen_signals(listener)
    }

    /// See [`Consistency::unlisten_signals`].
    fn unlisten_signals(&mut self, key: ListenerKey) -> bool {
        self.consistency_mut().unlisten_signals(key)
    }
}

/// Shared mailbox for signals coming from an object the receiver does not own.
///
/// Register [`SignalInbox::listener`] on the source and drain the inbox from the receiver.
#[derive(Clone, Debug, Default)]
pub struct SignalInbox(Rc<Cell<Signal>>);

impl SignalInbox {
    /// Creates an empty inbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `signal` to the inbox.
    pub fn post(&self, signal: Signal) {
        self.0.set(self.0.get() | signal);
    }

    /// Signals received so far.
    pub fn peek(&self) -> Signal {
        self.0.get()
    }

    /// Drains the inbox.
    pub fn take(&self) -> Signal {
        self.0.replace(Signal::NONE)
    }

    /// A listener that posts every event into this inbox.
    pub fn listener(&self) -> impl FnMut(&SignalEvent) + 'static {
        let inbox = self.clone();
        move |event| inbox.post(event.signal)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;
    use core::cell::RefCell;

    use super::*;

    const SUPPORTED: ConsistencyState = ConsistencyState::DATA
        .union(ConsistencyState::BOUNDS)
        .union(ConsistencyState::APPEARANCE);

    fn clean() -> Consistency {
        let mut c = Consistency::new(SUPPORTED, Signal::ALL);
        c.mark_consistent(ConsistencyState::ALL);
        c
    }

    fn recorder(c: &mut Consistency) -> Rc<RefCell<Vec<Signal>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        c.listen_signals(move |e| sink.borrow_mut().push(e.signal));
        log
    }

    #[test]
    fn starts_fully_dirty() {
        let c = Consistency::new(SUPPORTED, Signal::ALL);
        assert_eq!(c.state(), SUPPORTED);
        assert!(!c.is_consistent());
    }

    #[test]
    fn invalidation_composes() {
        let mut c = clean();
        c.invalidate(ConsistencyState::DATA, Signal::NEEDS_REDRAW);
        c.invalidate(ConsistencyState::BOUNDS, Signal::NEEDS_REDRAW);
        assert!(c.has_invalidation_state(ConsistencyState::DATA));
        assert!(c.has_invalidation_state(ConsistencyState::BOUNDS));

        c.mark_consistent(ConsistencyState::DATA);
        assert!(!c.has_invalidation_state(ConsistencyState::DATA));
        assert!(c.has_invalidation_state(ConsistencyState::BOUNDS));
    }

    #[test]
    fn only_newly_dirtied_bits_dispatch() {
        let mut c = clean();
        let log = recorder(&mut c);

        let eff = c.invalidate(ConsistencyState::DATA, Signal::NEEDS_REDRAW);
        assert_eq!(eff, ConsistencyState::DATA);
        let eff = c.invalidate(ConsistencyState::DATA, Signal::NEEDS_REDRAW);
        assert!(eff.is_empty());
        assert_eq!(*log.borrow(), vec![Signal::NEEDS_REDRAW]);
    }

    #[test]
    fn unsupported_bits_are_ignored() {
        let mut c = clean();
        let log = recorder(&mut c);
        let eff = c.invalidate(ConsistencyState::TITLE, Signal::NEEDS_REDRAW);
        assert!(eff.is_empty());
        assert!(c.is_consistent());
        assert!(log.borrow().is_empty());

        let mut c = Consistency::new(SUPPORTED, Signal::NEEDS_REDRAW);
        c.mark_consistent(ConsistencyState::ALL);
        c.invalidate(
            ConsistencyState::DATA,
            Signal::NEEDS_REDRAW | Signal::DATA_CHANGED,
        );
        assert_eq!(c.take_signals(), Signal::NEEDS_REDRAW);
    }

    #[test]
    fn suspension_accumulates_and_nests() {
        let mut c = clean();
        let log = recorder(&mut c);

        c.suspend_signals();
        c.suspend_signals();
        c.invalidate(ConsistencyState::DATA, Signal::DATA_CHANGED);
        c.invalidate(ConsistencyState::BOUNDS, Signal::BOUNDS_CHANGED);
        c.resume_signals(true);
        assert!(log.borrow().is_empty());
        c.resume_signals(true);
        assert_eq!(
            *log.borrow(),
            vec![Signal::DATA_CHANGED | Signal::BOUNDS_CHANGED]
        );
    }

    #[test]
    fn resume_without_dispatch_drops_signals() {
        let mut c = clean();
        let log = recorder(&mut c);
        c.suspend_signals();
        c.invalidate(ConsistencyState::DATA, Signal::DATA_CHANGED);
        c.resume_signals(false);
        assert!(log.borrow().is_empty());
        assert!(c.has_invalidation_state(ConsistencyState::DATA));
        assert!(c.take_signals().is_empty());
    }

    #[test]
    fn listeners_run_in_order_and_can_be_removed() {
        let mut c = clean();
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = log.clone();
        let key = c.listen_signals(move |_| first.borrow_mut().push(1));
        let second = log.clone();
        c.listen_signals(move |_| second.borrow_mut().push(2));

        c.dispatch_signal(Signal::NEEDS_REDRAW);
        assert!(c.unlisten_signals(key));
        assert!(!c.unlisten_signals(key));
        c.dispatch_signal(Signal::NEEDS_REDRAW);
        assert_eq!(*log.borrow(), vec![1, 2, 2]);
    }

    #[test]
    fn take_signals_drains() {
        let mut c = clean();
        c.dispatch_signal(Signal::NEEDS_REDRAW);
        c.dispatch_signal(Signal::META_CHANGED);
        assert_eq!(c.take_signals(), Signal::NEEDS_REDRAW | Signal::META_CHANGED);
        assert!(c.take_signals().is_empty());
    }

    #[test]
    fn inbox_collects_from_listener() {
        let mut c = clean();
        let inbox = SignalInbox::new();
        c.listen_signals(inbox.listener());
        c.invalidate(ConsistencyState::DATA, Signal::DATA_CHANGED);
        assert_eq!(inbox.peek(), Signal::DATA_CHANGED);
        assert_eq!(inbox.take(), Signal::DATA_CHANGED);
        assert!(inbox.peek().is_empty());
    }
}
