use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

/// Axis-aligned movement direction. Screen coordinates: up is negative y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// What a keystroke asks the game to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Stop,
    Quit,
}

impl Command {
    /// Map a single key (case-insensitive) to a command. Keys outside
    /// `w a s d space q` are ignored.
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'w' => Some(Self::Move(Direction::Up)),
            's' => Some(Self::Move(Direction::Down)),
            'a' => Some(Self::Move(Direction::Left)),
            'd' => Some(Self::Move(Direction::Right)),
            ' ' => Some(Self::Stop),
            'q' => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Source of single-character keystrokes.
pub trait KeySource {
    /// Next pending key, if any. Must never block.
    fn poll_key(&mut self) -> anyhow::Result<Option<char>>;

    /// Block until a key arrives. Sources that cannot block return `None`.
    fn wait_key(&mut self) -> anyhow::Result<Option<char>> {
        Ok(None)
    }
}

/// Keyboard input from a raw-mode terminal.
#[derive(Debug, Default)]
pub struct CrosstermKeys;

impl CrosstermKeys {
    pub fn new() -> Self {
        Self
    }

    fn key_from_event(event: Event) -> Option<char> {
        let Event::Key(key) = event else {
            return None;
        };
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            // Raw mode swallows SIGINT, so treat Ctrl+C as quit.
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some('q'),
            KeyCode::Char(c) if c.is_ascii() => Some(c),
            _ => None,
        }
    }
}

impl KeySource for CrosstermKeys {
    fn poll_key(&mut self) -> anyhow::Result<Option<char>> {
        while event::poll(Duration::ZERO)? {
            if let Some(key) = Self::key_from_event(event::read()?) {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    fn wait_key(&mut self) -> anyhow::Result<Option<char>> {
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Self::key_from_event(Event::Key(key)).or(Some('\n')));
                }
            }
        }
    }
}

/// Input for non-interactive runs: never produces a key.
#[derive(Debug, Default)]
pub struct NullKeys;

impl KeySource for NullKeys {
    fn poll_key(&mut self) -> anyhow::Result<Option<char>> {
        Ok(None)
    }
}

/// Replays a fixed sequence of keys, one per poll.
#[derive(Debug, Default)]
pub struct ScriptedKeys {
    keys: VecDeque<Option<char>>,
}

impl ScriptedKeys {
    /// `None` entries are polls that see no key.
    pub fn new(keys: impl IntoIterator<Item = Option<char>>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl KeySource for ScriptedKeys {
    fn poll_key(&mut self) -> anyhow::Result<Option<char>> {
        Ok(self.keys.pop_front().flatten())
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEvent;

    use super::*;

    #[test]
    fn test_recognized_keys() {
        assert_eq!(Command::from_key('w'), Some(Command::Move(Direction::Up)));
        assert_eq!(Command::from_key('a'), Some(Command::Move(Direction::Left)));
        assert_eq!(Command::from_key('s'), Some(Command::Move(Direction::Down)));
        assert_eq!(Command::from_key('d'), Some(Command::Move(Direction::Right)));
        assert_eq!(Command::from_key(' '), Some(Command::Stop));
        assert_eq!(Command::from_key('q'), Some(Command::Quit));
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        assert_eq!(Command::from_key('W'), Command::from_key('w'));
        assert_eq!(Command::from_key('Q'), Some(Command::Quit));
    }

    #[test]
    fn test_other_keys_are_ignored() {
        for key in ['x', '1', '\n', 'é', 'Z'] {
            assert_eq!(Command::from_key(key), None, "{key:?}");
        }
    }

    #[test]
    fn test_crossterm_event_mapping() {
        let press = |code, modifiers| Event::Key(KeyEvent::new(code, modifiers));
        assert_eq!(CrosstermKeys::key_from_event(press(KeyCode::Char('w'), KeyModifiers::NONE)), Some('w'));
        assert_eq!(CrosstermKeys::key_from_event(press(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some('q'));
        assert_eq!(CrosstermKeys::key_from_event(press(KeyCode::Up, KeyModifiers::NONE)), None);
        assert_eq!(CrosstermKeys::key_from_event(Event::FocusGained), None);
    }

    #[test]
    fn test_scripted_keys_replay_in_order() {
        let mut keys = ScriptedKeys::new([Some('d'), None, Some('q')]);
        assert_eq!(keys.poll_key().unwrap(), Some('d'));
        assert_eq!(keys.poll_key().unwrap(), None);
        assert_eq!(keys.poll_key().unwrap(), Some('q'));
        assert_eq!(keys.poll_key().unwrap(), None);
    }

    #[test]
    fn test_null_keys_never_block() {
        let mut keys = NullKeys;
        assert_eq!(keys.poll_key().unwrap(), None);
        assert_eq!(keys.wait_key().unwrap(), None);
    }
}
