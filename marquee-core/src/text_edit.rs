//! Text buffer for the selected marker, with hold-to-repeat deletion
//!
//! The repeat timer is poll driven: the host calls [`TextEditSession::poll`]
//! from its event loop and uses [`TextEditSession::next_deadline`] to decide
//! how long to wait. Nothing runs in the background, so dropping or cancelling
//! the session cannot leave a live callback behind.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::model::MarkerId;

pub const DEFAULT_REPEAT_INTERVAL: Duration = Duration::from_millis(100);

/// How much text one deletion step removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// One trailing character
    Char,
    /// Everything from the last space onwards
    Word,
}

#[derive(Debug, Clone)]
struct RepeatTimer {
    /// Text as it was when the key went down; every tick re-derives from this
    original: String,
    mode: DeleteMode,
    count: usize,
    next_tick: Instant,
}

#[derive(Debug, Clone)]
pub struct TextEditSession {
    id: MarkerId,
    text: String,
    repeat: Option<RepeatTimer>,
    interval: Duration,
}

impl TextEditSession {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_REPEAT_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            id: MarkerId::NONE,
            text: String::new(),
            repeat: None,
            interval,
        }
    }

    /// Start editing `id`'s text. Any running repeat is cancelled.
    pub fn begin(&mut self, id: MarkerId, text: impl Into<String>) {
        self.cancel_repeat();
        self.id = id;
        self.text = if id.is_some() { text.into() } else { String::new() };
    }

    pub fn end(&mut self) {
        self.begin(MarkerId::NONE, "");
    }

    pub fn active_id(&self) -> MarkerId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Typing is only accepted while a marker is selected
    pub fn is_enabled(&self) -> bool {
        self.id.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Append one character and return the new text
    pub fn push_char(&mut self, c: char) -> Option<&str> {
        if !self.is_enabled() {
            return None;
        }
        self.text.push(c);
        Some(self.text.as_str())
    }

    /// Key-down of a delete key. Removes one unit now and arms the repeat timer;
    /// ignored while the timer is already running. Returns the text if it changed.
    pub fn delete_down(&mut self, mode: DeleteMode, now: Instant) -> Option<&str> {
        if !self.is_enabled() || self.repeat.is_some() {
            return None;
        }

        let original = self.text.clone();
        let changed = self.apply(&original, mode, 1);
        self.repeat = Some(RepeatTimer {
            original,
            mode,
            count: 1,
            next_tick: now + self.interval,
        });

        if changed {
            Some(self.text.as_str())
        } else {
            None
        }
    }

    /// Key-up of a delete key: stop repeating and reset the counter
    pub fn delete_up(&mut self) {
        self.cancel_repeat();
    }

    /// Fire every tick that has come due by `now`. Returns the text if it changed.
    pub fn poll(&mut self, now: Instant) -> Option<&str> {
        let mut repeat = self.repeat.take()?;

        let mut ticked = false;
        while now >= repeat.next_tick {
            repeat.count += 1;
            repeat.next_tick += self.interval;
            ticked = true;
        }

        let changed = ticked && self.apply(&repeat.original, repeat.mode, repeat.count);
        if ticked {
            trace!(count = repeat.count, "delete repeat tick");
        }
        self.repeat = Some(repeat);

        if changed {
            Some(self.text.as_str())
        } else {
            None
        }
    }

    pub fn cancel_repeat(&mut self) {
        self.repeat = None;
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat.is_some()
    }

    /// Units removed since the delete key went down, 0 when idle
    pub fn repeat_count(&self) -> usize {
        self.repeat.as_ref().map(|r| r.count).unwrap_or(0)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.repeat.as_ref().map(|r| r.next_tick)
    }

    fn apply(&mut self, original: &str, mode: DeleteMode, units: usize) -> bool {
        let next = remove_units(original, mode, units);
        if next == self.text {
            return false;
        }
        self.text = next;
        true
    }
}

impl Default for TextEditSession {
    fn default() -> Self {
        Self::new()
    }
}

/// `original` with `units` deletion steps applied
pub fn remove_units(original: &str, mode: DeleteMode, units: usize) -> String {
    match mode {
        DeleteMode::Char => {
            let keep = original.chars().count().saturating_sub(units);
            original.chars().take(keep).collect()
        }
        DeleteMode::Word => {
            let mut rest = original;
            for _ in 0..units {
                rest = match rest.rfind(' ') {
                    Some(pos) => &rest[..pos],
                    None => "",
                };
            }
            rest.to_string()
        }
    }
}
