// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental redraw plumbing for lune charts.
//!
//! - **Consistency**: per-component dirty flags ([`ConsistencyState`]) and outward
//!   notifications ([`Signal`]) with synchronous, suspendable dispatch.
//! - **Visuals**: the enabled/z-index/container/bounds base every drawable shares, and the
//!   [`Drawable`] contract.
//! - **Interactivity**: sparse per-point hover/select state.
//! - **Resolution chains**: pick the first present setting from point, state, normal and
//!   default levels.
//! - **Marks**: retained output with stable ids, diffed across draws by [`Scene`].
//! - **Sessions**: scoped cursor overrides for drag interactions.
//!
//! Everything is single-threaded. A draw pass must not mutate data it observes: doing so
//! re-enters invalidation mid-draw.

#![no_std]

extern crate alloc;

mod consistency;
mod invalidation;
mod mark;
mod point_state;
pub mod resolve;
mod scene;
mod session;
mod visual;

pub use consistency::{ConsistencyState, Signal, SignalEvent};
pub use invalidation::{Consistency, Invalidatable, ListenerKey, SignalInbox};
pub use mark::{
    Mark, MarkId, MarkPayload, PathMark, RectMark, TextAnchor, TextBaseline, TextMark,
};
pub use point_state::{
    InteractivityState, PointChange, PointSelector, PointState, PointStateful, clarify_state,
    is_state_contains,
};
pub use scene::{MarkDiff, Scene};
pub use session::{Cursor, CursorHost, InteractionSession};
pub use visual::{Drawable, LayerId, VISUAL_SIGNALS, VISUAL_STATES, Visual};
