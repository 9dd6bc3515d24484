//! Keyboard and pointer controls.

use std::str::FromStr;

use spritereel_core::{ReelError, ReelResult, SpriteId};

use crate::session::{RecordingState, Still};
use crate::studio::Studio;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Space,
    Char(char),
}

impl FromStr for Key {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ArrowLeft" | "left" => Ok(Key::ArrowLeft),
            "ArrowRight" | "right" => Ok(Key::ArrowRight),
            "Space" | "space" | " " => Ok(Key::Space),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Key::Char(c)),
                    _ => Err(ReelError::InvalidArgument(format!("unknown key '{}'", s))),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Prev,
    Next,
    Select(SpriteId),
    ToggleRecording,
    Snapshot,
    PreviewClick,
    ThumbnailClick(SpriteId),
    Discard,
}

impl Control {
    /// Map a key press. `s`/`S` only means something while recording.
    pub fn from_key(key: Key, recording: bool) -> Option<Control> {
        match key {
            Key::ArrowLeft => Some(Control::Prev),
            Key::ArrowRight => Some(Control::Next),
            Key::Space => Some(Control::ToggleRecording),
            Key::Char('s') | Key::Char('S') if recording => Some(Control::Snapshot),
            Key::Char(_) => None,
        }
    }
}

#[derive(Debug)]
pub enum ControlOutcome {
    Ignored,
    SelectionChanged,
    RecordingStarted,
    RecordingFinished,
    Snapshot(Still),
    Discarded,
}

impl Studio {
    pub fn handle(&mut self, control: Control) -> ReelResult<ControlOutcome> {
        let changed = |yes: bool| {
            if yes {
                ControlOutcome::SelectionChanged
            } else {
                ControlOutcome::Ignored
            }
        };
        let outcome = match control {
            Control::Prev => changed(self.prev()),
            Control::Next => changed(self.next()),
            Control::Select(id) | Control::ThumbnailClick(id) => changed(self.select(id)),
            Control::ToggleRecording => {
                if self.session().state() == RecordingState::Active {
                    match self.stop_recording()? {
                        Some(_) => ControlOutcome::RecordingFinished,
                        None => ControlOutcome::Ignored,
                    }
                } else if self.start_recording()? {
                    ControlOutcome::RecordingStarted
                } else {
                    ControlOutcome::Ignored
                }
            }
            Control::Snapshot | Control::PreviewClick => match self.snapshot()? {
                Some(still) => ControlOutcome::Snapshot(still),
                None => ControlOutcome::Ignored,
            },
            Control::Discard => {
                if self.discard_recording() {
                    ControlOutcome::Discarded
                } else {
                    ControlOutcome::Ignored
                }
            }
        };
        Ok(outcome)
    }

    pub fn handle_key(&mut self, key: Key) -> ReelResult<ControlOutcome> {
        match Control::from_key(key, self.session().is_active()) {
            Some(control) => self.handle(control),
            None => Ok(ControlOutcome::Ignored),
        }
    }
}
