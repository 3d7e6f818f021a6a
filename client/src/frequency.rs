//! Fixed-format `DDD.DDD` frequency entry with overtype semantics
//!
//! The six digits are the only state. The formatted string and the numeric
//! value are derived from them, so every state is a well-formed frequency
//! string. Cursor positions index the seven-character formatted string:
//!
//! ```text
//!  D D D . D D D
//! 0 1 2 3 4 5 6 7
//! ```
//!
//! Position 3 sits right before the separator and is never a resting
//! position. Position 7 is after the last digit.

use srs_shared::{FrequencyKind, FrequencySettings};

use crate::error::FrequencyError;

pub const DIGIT_COUNT: usize = 6;
pub const SEPARATOR_POS: usize = 3;
pub const CURSOR_END: usize = 7;

pub const MIN_FREQUENCY: f64 = 0.001;
pub const MAX_FREQUENCY: f64 = 999.999;

const MAX_MILLI: u32 = 999_999;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrequencyEditBuffer {
    digits: [u8; DIGIT_COUNT],
}

impl FrequencyEditBuffer {
    /// `000.000`
    pub fn new() -> Self {
        Self::default()
    }

    /// Rounds to thousandths and clamps into the mask. Non-finite and negative
    /// values load as `000.000`.
    pub fn from_value(value: f64) -> Self {
        let milli = if value.is_finite() && value > 0.0 {
            ((value * 1000.0).round() as u64).min(MAX_MILLI as u64) as u32
        } else {
            0
        };
        Self::from_milli(milli)
    }

    fn from_milli(mut milli: u32) -> Self {
        let mut digits = [0u8; DIGIT_COUNT];
        for slot in digits.iter_mut().rev() {
            *slot = (milli % 10) as u8;
            milli /= 10;
        }
        Self { digits }
    }

    /// The six digits, most significant first
    pub fn digits(&self) -> [u8; DIGIT_COUNT] {
        self.digits
    }

    /// Always seven characters, `DDD.DDD`
    pub fn formatted(&self) -> String {
        let mut out = String::with_capacity(CURSOR_END);
        for (index, digit) in self.digits.iter().enumerate() {
            if index == SEPARATOR_POS {
                out.push('.');
            }
            out.push(char::from(b'0' + digit));
        }
        out
    }

    /// The value in thousandths, `0..=999_999`
    pub fn milli(&self) -> u32 {
        self.digits
            .iter()
            .fold(0u32, |acc, digit| acc * 10 + *digit as u32)
    }

    pub fn numeric_value(&self) -> f64 {
        self.milli() as f64 / 1000.0
    }

    fn with_digit(mut self, index: usize, digit: u8) -> Self {
        self.digits[index] = digit;
        self
    }
}

/// Key events the mask reacts to. Everything else is [`EditKey::Other`] and
/// left to the surrounding text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Digit(u8),
    Backspace,
    Left,
    Right,
    Other,
}

impl EditKey {
    /// Maps a typed character; non-digits become [`EditKey::Other`]
    pub fn from_char(c: char) -> Self {
        match c.to_digit(10) {
            Some(digit) => EditKey::Digit(digit as u8),
            None => EditKey::Other,
        }
    }
}

/// Digit index addressed by a cursor position, if it is a digit slot
fn slot_index(pos: usize) -> Option<usize> {
    match pos {
        0..=2 => Some(pos),
        4..=6 => Some(pos - 1),
        _ => None,
    }
}

fn rest_moving_left(pos: usize) -> usize {
    if pos == SEPARATOR_POS {
        SEPARATOR_POS - 1
    } else {
        pos
    }
}

fn rest_moving_right(pos: usize) -> usize {
    if pos == SEPARATOR_POS {
        SEPARATOR_POS + 1
    } else {
        pos.min(CURSOR_END)
    }
}

/// One transition of the overtype state machine
///
/// A digit overwrites the slot under the cursor and advances, hopping over
/// the separator. Backspace zeroes the slot left of the cursor and moves
/// back. Keys that do not apply at the current position leave both the
/// buffer and the cursor unchanged.
pub fn apply_key(
    buffer: FrequencyEditBuffer,
    cursor: usize,
    key: EditKey,
) -> (FrequencyEditBuffer, usize) {
    match key {
        EditKey::Digit(digit) if digit <= 9 => match slot_index(cursor) {
            Some(index) => (buffer.with_digit(index, digit), rest_moving_right(cursor + 1)),
            None => (buffer, cursor),
        },
        EditKey::Backspace => match cursor {
            0 => (buffer, cursor),
            // Right after the separator: clear the first fractional digit and
            // hop over the separator
            4 => (buffer.with_digit(3, 0), SEPARATOR_POS - 1),
            _ => match slot_index(cursor - 1) {
                Some(index) => (buffer.with_digit(index, 0), rest_moving_left(cursor - 1)),
                None => (buffer, cursor),
            },
        },
        EditKey::Left if cursor > 0 => (buffer, rest_moving_left((cursor - 1).min(CURSOR_END))),
        EditKey::Right if cursor < CURSOR_END => (buffer, rest_moving_right(cursor + 1)),
        _ => (buffer, cursor),
    }
}

/// Edit buffer plus cursor, driven by [`apply_key`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyMaskEditor {
    buffer: FrequencyEditBuffer,
    cursor: usize,
}

impl FrequencyMaskEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an existing frequency with the cursor at the start
    pub fn with_value(value: f64) -> Self {
        Self {
            buffer: FrequencyEditBuffer::from_value(value),
            cursor: 0,
        }
    }

    /// Applies one key press and moves the cursor
    ///
    /// Returns true if the digits changed.
    pub fn handle_key(&mut self, key: EditKey) -> bool {
        let (buffer, cursor) = apply_key(self.buffer, self.cursor, key);
        let changed = buffer != self.buffer;
        self.buffer = buffer;
        self.cursor = cursor;
        changed
    }

    /// Feeds every character of `input` through [`FrequencyMaskEditor::handle_key`],
    /// as if typed at the current cursor
    pub fn type_str(&mut self, input: &str) {
        for c in input.chars() {
            self.handle_key(EditKey::from_char(c));
        }
    }

    /// Click or selection placement: clamps into the string and never rests
    /// on the separator
    pub fn place_cursor(&mut self, pos: usize) {
        self.cursor = rest_moving_right(pos);
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn buffer(&self) -> FrequencyEditBuffer {
        self.buffer
    }

    pub fn formatted(&self) -> String {
        self.buffer.formatted()
    }

    pub fn numeric_value(&self) -> f64 {
        self.buffer.numeric_value()
    }
}

/// Renders a stored frequency in mask form, e.g. `251.5` as `251.500`
pub fn format_frequency(value: f64) -> String {
    FrequencyEditBuffer::from_value(value).formatted()
}

/// Accepts values within `[0.001, 999.999]`
pub fn validate_frequency(value: f64) -> Result<f64, FrequencyError> {
    if value.is_nan() {
        return Err(FrequencyError::NotANumber);
    }
    if value < MIN_FREQUENCY {
        return Err(FrequencyError::BelowMinimum(value));
    }
    if value > MAX_FREQUENCY {
        return Err(FrequencyError::AboveMaximum(value));
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencySubmission {
    pub kind: FrequencyKind,
    pub frequency: f64,
}

/// The "add frequency" form: list selection plus the mask editor
#[derive(Debug, Clone)]
pub struct FrequencyForm {
    pub kind: FrequencyKind,
    pub editor: FrequencyMaskEditor,
}

impl FrequencyForm {
    pub fn new(kind: FrequencyKind) -> Self {
        Self {
            kind,
            editor: FrequencyMaskEditor::new(),
        }
    }

    /// Validates the editor's current value for the selected list
    pub fn submit(&self) -> Result<FrequencySubmission, FrequencyError> {
        let frequency = validate_frequency(self.editor.numeric_value())?;
        Ok(FrequencySubmission {
            kind: self.kind,
            frequency,
        })
    }
}

impl Default for FrequencyForm {
    fn default() -> Self {
        Self::new(FrequencyKind::Global)
    }
}

/// Local edits to the global and test lists before they are saved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyListDraft {
    settings: FrequencySettings,
    dirty: bool,
}

impl FrequencyListDraft {
    pub fn from_settings(settings: &FrequencySettings) -> Self {
        Self {
            settings: settings.clone(),
            dirty: false,
        }
    }

    /// Discards local edits in favour of a fresh snapshot
    pub fn replace(&mut self, settings: &FrequencySettings) {
        self.settings = settings.clone();
        self.dirty = false;
    }

    pub fn list(&self, kind: FrequencyKind) -> &[f64] {
        self.settings.list(kind)
    }

    /// Appends to the submission's list. The value is validated again, since
    /// a submission can be built by hand.
    pub fn add(&mut self, submission: FrequencySubmission) -> Result<(), FrequencyError> {
        let frequency = validate_frequency(submission.frequency)?;
        self.settings.list_mut(submission.kind).push(frequency);
        self.dirty = true;
        Ok(())
    }

    /// Removes the entry at `index`, or returns `None` if out of range
    pub fn remove(&mut self, kind: FrequencyKind, index: usize) -> Option<f64> {
        let list = self.settings.list_mut(kind);
        if index >= list.len() {
            return None;
        }
        self.dirty = true;
        Some(list.remove(index))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The edited lists, ready for `save_frequencies`
    pub fn to_settings(&self) -> FrequencySettings {
        self.settings.clone()
    }
}
