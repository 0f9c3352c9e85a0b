//! Single-key command table.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use opsdeck_core::{SourceId, Tool};

/// What a key press asks the main loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Full-depth listing of one source, until the next key.
    Detail(SourceId),
    /// Start a configured helper detached.
    RunTool(Tool),
    /// Bounded packet capture shown in a sub-view.
    PacketScan,
    /// Append a snapshot now.
    Snapshot,
    Quit,
}

impl Command {
    /// Look up the command bound to `key`. Letters are case-insensitive;
    /// Ctrl-C always quits. Unbound keys yield `None`.
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c' | 'C')) => Some(Self::Quit),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                Self::from_letter(c.to_ascii_lowercase())
            }
            _ => None,
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        let cmd = match c {
            'g' => Self::Detail(SourceId::Github),
            'v' => Self::Detail(SourceId::Vercel),
            'n' => Self::Detail(SourceId::Netlify),
            'd' => Self::Detail(SourceId::Device),
            'p' => Self::Detail(SourceId::Network),
            'a' => Self::RunTool(Tool::A),
            'b' => Self::RunTool(Tool::B),
            's' => Self::PacketScan,
            'l' => Self::Snapshot,
            'q' => Self::Quit,
            _ => return None,
        };
        Some(cmd)
    }
}

/// Key hints for header row 2: `(key, label)`.
pub const KEY_HINTS: &[(&str, &str)] = &[
    ("g", "github"),
    ("v", "vercel"),
    ("n", "netlify"),
    ("d", "device"),
    ("p", "ports"),
    ("a/b", "tools"),
    ("s", "scan"),
    ("l", "log"),
    ("q", "quit"),
];
