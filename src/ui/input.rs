//! Input box editing and key bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Lines scrolled per PgUp/PgDn.
const PAGE: u16 = 10;

/// What a key press asks the UI loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    None,
    /// Input changed; redraw.
    Edited,
    Submit,
    Quit,
    ScrollUp(u16),
    ScrollDown(u16),
    ScrollToBottom,
    /// Answer to the open modal.
    Resolve(bool),
}

/// Multi-line text being composed.
#[derive(Debug, Default, Clone)]
pub struct InputBuffer {
    text: String,
    /// Cursor position in chars.
    cursor: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    /// Take the text, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// (line, column) of the cursor, both 0-based.
    pub fn cursor_position(&self) -> (usize, usize) {
        let before: String = self.text.chars().take(self.cursor).collect();
        let line = before.matches('\n').count();
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count());
        (line, column)
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }
}

/// Map a key press to an action, editing `input` as needed.
pub fn handle_key(key: KeyEvent, modal_open: bool, input: &mut InputBuffer) -> UiAction {
    if key.kind != KeyEventKind::Press {
        return UiAction::None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d')) {
        return UiAction::Quit;
    }

    if modal_open {
        return match key.code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => UiAction::Resolve(true),
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => UiAction::Resolve(false),
            _ => UiAction::None,
        };
    }

    match key.code {
        KeyCode::Enter
            if key
                .modifiers
                .intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) =>
        {
            input.insert('\n');
            UiAction::Edited
        }
        KeyCode::Enter => UiAction::Submit,
        KeyCode::Char('j') if ctrl => {
            input.insert('\n');
            UiAction::Edited
        }
        KeyCode::Char('u') if ctrl => {
            input.take();
            UiAction::Edited
        }
        KeyCode::Char(c) => {
            input.insert(c);
            UiAction::Edited
        }
        KeyCode::Backspace => {
            input.backspace();
            UiAction::Edited
        }
        KeyCode::Delete => {
            input.delete();
            UiAction::Edited
        }
        KeyCode::Left => {
            input.move_left();
            UiAction::Edited
        }
        KeyCode::Right => {
            input.move_right();
            UiAction::Edited
        }
        KeyCode::Home => {
            input.home();
            UiAction::Edited
        }
        KeyCode::End if ctrl => UiAction::ScrollToBottom,
        KeyCode::End => {
            input.end();
            UiAction::Edited
        }
        KeyCode::PageUp => UiAction::ScrollUp(PAGE),
        KeyCode::PageDown => UiAction::ScrollDown(PAGE),
        KeyCode::Up if ctrl => UiAction::ScrollUp(1),
        KeyCode::Down if ctrl => UiAction::ScrollDown(1),
        _ => UiAction::None,
    }
}
