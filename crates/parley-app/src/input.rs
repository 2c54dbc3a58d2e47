//! Terminal-agnostic keyboard input and line editing.

/// Keyboard input abstraction.
///
/// Decouples application logic from terminal libraries (crossterm, termion,
/// etc.) enabling deterministic simulation testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key (delete character at cursor).
    Delete,
    /// Escape key (leave, or quit from the join screen).
    Esc,
    /// Ctrl-C (quit from anywhere).
    Interrupt,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Home key (cursor to start).
    Home,
    /// End key (cursor to end).
    End,
}

/// What an editing key did to a [`TextField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// Nothing happened (cursor at a boundary, or not an editing key).
    Unchanged,
    /// Only the cursor moved.
    Moved,
    /// The text changed.
    Changed,
}

/// Single-line text buffer with a cursor.
///
/// The cursor counts characters, not bytes, so multi-byte input edits
/// cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    buffer: String,
    cursor: usize,
}

impl TextField {
    /// Create an empty field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the field is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Apply an editing key. Enter, Esc and Interrupt are not editing keys.
    pub fn apply(&mut self, key: KeyInput) -> Edit {
        let len = self.buffer.chars().count();
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.buffer.insert(at, c);
                self.cursor += 1;
                Edit::Changed
            },
            KeyInput::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                Edit::Changed
            },
            KeyInput::Delete if self.cursor < len => {
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                Edit::Changed
            },
            KeyInput::Left if self.cursor > 0 => {
                self.cursor -= 1;
                Edit::Moved
            },
            KeyInput::Right if self.cursor < len => {
                self.cursor += 1;
                Edit::Moved
            },
            KeyInput::Home if self.cursor > 0 => {
                self.cursor = 0;
                Edit::Moved
            },
            KeyInput::End if self.cursor < len => {
                self.cursor = len;
                Edit::Moved
            },
            _ => Edit::Unchanged,
        }
    }

    /// Take the text and reset the field.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Reset the field.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(i, _)| i)
    }
}
