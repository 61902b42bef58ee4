// Copyright 2025 the Lune Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scoped pointer-cursor overrides for drag interactions.

/// Pointer cursor shapes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// Platform default.
    #[default]
    Default,
    /// Pointing hand.
    Pointer,
    /// Horizontal resize (drag left/right).
    ColResize,
    /// Vertical resize (drag up/down).
    RowResize,
    /// Move.
    Move,
}

/// Whatever owns the visible cursor (a window, a document, a test double).
pub trait CursorHost {
    /// Cursor currently shown.
    fn cursor(&self) -> Cursor;

    /// Shows `cursor`.
    fn set_cursor(&mut self, cursor: Cursor);
}

/// A drag interaction holding a cursor override.
///
/// The previous cursor is restored when the session ends, including when it is dropped
/// without an explicit [`InteractionSession::finish`].
#[derive(Debug)]
pub struct InteractionSession<'h, H: CursorHost + ?Sized> {
    host: &'h mut H,
    previous: Cursor,
}

impl<'h, H: CursorHost + ?Sized> InteractionSession<'h, H> {
    /// Starts a session showing `cursor`.
    pub fn begin(host: &'h mut H, cursor: Cursor) -> Self {
        let previous = host.cursor();
        host.set_cursor(cursor);
        Self { host, previous }
    }

    /// Cursor that will be restored.
    pub fn previous(&self) -> Cursor {
        self.previous
    }

    /// Changes the cursor for the rest of the session.
    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.host.set_cursor(cursor);
    }

    /// Ends the session.
    pub fn finish(self) {}
}

impl<H: CursorHost + ?Sized> Drop for InteractionSession<'_, H> {
    fn drop(&mut self) {
        self.host.set_cursor(self.previous);
    }
}
