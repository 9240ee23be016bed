//! Layer-switching actions fired on key press and release.
//!
//! An [`Action`] is one byte on the wire:
//!
//! ```text
//! bit 7-6  kind   00 = none, 01 = relative, 10 = absolute, 11 = reserved
//! bit 5-0  arg    6-bit two's complement (relative) or layer index (absolute)
//! ```
//!
//! # Text syntax
//!
//! ```text
//! none     → NoAct
//! rel:+2   → Rel(2)
//! rel:-1   → Rel(-1)
//! -1       → Rel(-1)       (shorthand)
//! abs:3    → Abs(3)
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LayoutError;

/// Largest layer shift a relative action may request
pub const MAX_REL: i8 = 16;

/// Highest layer an absolute action may target
pub const MAX_ABS: u8 = 16;

mod wire {
    pub const KIND_MASK: u8 = 0xC0;
    pub const ARG_MASK: u8 = 0x3F;
    pub const SIGN_BIT: u8 = 0x20;

    pub const NO_ACT: u8 = 0x00;
    pub const REL: u8 = 0x40;
    pub const ABS: u8 = 0x80;
}

/// Discriminant of an [`Action`], used when building one from loose parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    NoAct,
    Rel,
    Abs,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::NoAct => write!(f, "none"),
            ActionKind::Rel => write!(f, "rel"),
            ActionKind::Abs => write!(f, "abs"),
        }
    }
}

/// What happens to the active layer when a key transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    /// Leave the layer alone
    #[default]
    NoAct,
    /// Shift the current layer by `n` (`-16..=16`)
    Rel(i8),
    /// Jump to layer `n` (`0..=16`)
    Abs(u8),
}

impl Action {
    /// Build an action from a kind and an unchecked argument.
    ///
    /// `NoAct` ignores `arg`.
    pub fn new(kind: ActionKind, arg: i32) -> Result<Self, LayoutError> {
        let invalid = || LayoutError::InvalidAction { kind, arg };
        match kind {
            ActionKind::NoAct => Ok(Action::NoAct),
            ActionKind::Rel => {
                if (-i32::from(MAX_REL)..=i32::from(MAX_REL)).contains(&arg) {
                    Ok(Action::Rel(arg as i8))
                } else {
                    Err(invalid())
                }
            }
            ActionKind::Abs => {
                if (0..=i32::from(MAX_ABS)).contains(&arg) {
                    Ok(Action::Abs(arg as u8))
                } else {
                    Err(invalid())
                }
            }
        }
    }

    pub fn kind(self) -> ActionKind {
        match self {
            Action::NoAct => ActionKind::NoAct,
            Action::Rel(_) => ActionKind::Rel,
            Action::Abs(_) => ActionKind::Abs,
        }
    }

    /// Argument as a plain integer; 0 for `NoAct`
    pub fn arg(self) -> i32 {
        match self {
            Action::NoAct => 0,
            Action::Rel(n) => i32::from(n),
            Action::Abs(n) => i32::from(n),
        }
    }

    /// Encode to the one-byte wire form
    pub fn to_byte(self) -> u8 {
        match self {
            Action::NoAct => wire::NO_ACT,
            Action::Rel(n) => wire::REL | (n as u8 & wire::ARG_MASK),
            Action::Abs(n) => wire::ABS | (n & wire::ARG_MASK),
        }
    }

    /// Decode the one-byte wire form, re-checking the argument range
    pub fn from_byte(byte: u8) -> Result<Self, LayoutError> {
        let raw = byte & wire::ARG_MASK;
        match byte & wire::KIND_MASK {
            wire::NO_ACT => Ok(Action::NoAct),
            wire::REL => {
                let arg = if raw & wire::SIGN_BIT != 0 {
                    i32::from(raw) - 64
                } else {
                    i32::from(raw)
                };
                Action::new(ActionKind::Rel, arg)
            }
            wire::ABS => Action::new(ActionKind::Abs, i32::from(raw)),
            _ => Err(LayoutError::MalformedAction(byte)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NoAct => write!(f, "none"),
            Action::Rel(n) => write!(f, "rel:{n:+}"),
            Action::Abs(n) => write!(f, "abs:{n}"),
        }
    }
}

impl FromStr for Action {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        let parse_arg = |arg: &str| -> Result<i32, LayoutError> {
            arg.trim()
                .parse::<i32>()
                .map_err(|_| LayoutError::ParseAction(s.to_string()))
        };

        match text.as_str() {
            "" | "none" | "noact" => Ok(Action::NoAct),
            t if t.starts_with('+') || t.starts_with('-') => {
                Action::new(ActionKind::Rel, parse_arg(t)?)
            }
            t => match t.split_once(':') {
                Some(("rel", arg)) => Action::new(ActionKind::Rel, parse_arg(arg)?),
                Some(("abs", arg)) => Action::new(ActionKind::Abs, parse_arg(arg)?),
                _ => Err(LayoutError::ParseAction(s.to_string())),
            },
        }
    }
}

// Documents store actions in their text form.
impl Serialize for Action {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let text = String::deserialize(d)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rel_range_is_inclusive() {
        assert_eq!(Action::new(ActionKind::Rel, 16).unwrap(), Action::Rel(16));
        assert_eq!(Action::new(ActionKind::Rel, -16).unwrap(), Action::Rel(-16));
        assert!(matches!(
            Action::new(ActionKind::Rel, 17),
            Err(LayoutError::InvalidAction {
                kind: ActionKind::Rel,
                arg: 17
            })
        ));
        assert!(Action::new(ActionKind::Rel, -17).is_err());
    }

    #[test]
    fn abs_range() {
        assert_eq!(Action::new(ActionKind::Abs, 0).unwrap(), Action::Abs(0));
        assert_eq!(Action::new(ActionKind::Abs, 16).unwrap(), Action::Abs(16));
        assert!(Action::new(ActionKind::Abs, -1).is_err());
        assert!(Action::new(ActionKind::Abs, 17).is_err());
    }

    #[test]
    fn noact_ignores_arg() {
        let a = Action::new(ActionKind::NoAct, 1234).unwrap();
        assert_eq!(a, Action::NoAct);
        assert_eq!(a.arg(), 0);
        assert_eq!(a.to_byte(), 0x00);
    }

    #[test]
    fn wire_bytes() {
        assert_eq!(Action::Rel(1).to_byte(), 0x41);
        assert_eq!(Action::Rel(-1).to_byte(), 0x7F);
        assert_eq!(Action::Rel(-16).to_byte(), 0x70);
        assert_eq!(Action::Abs(3).to_byte(), 0x83);
        assert_eq!(Action::Abs(16).to_byte(), 0x90);
    }

    #[test]
    fn wire_decode_every_legal_value() {
        for n in -16..=16 {
            let a = Action::Rel(n);
            assert_eq!(Action::from_byte(a.to_byte()).unwrap(), a);
        }
        for n in 0..=16 {
            let a = Action::Abs(n);
            assert_eq!(Action::from_byte(a.to_byte()).unwrap(), a);
        }
        assert_eq!(Action::from_byte(0x00).unwrap(), Action::NoAct);
    }

    #[test]
    fn wire_decode_rejects_bad_bytes() {
        assert!(matches!(
            Action::from_byte(0xC1),
            Err(LayoutError::MalformedAction(0xC1))
        ));
        // rel:+17 and abs:20 fit in six bits but are out of range
        assert!(matches!(
            Action::from_byte(0x51),
            Err(LayoutError::InvalidAction { .. })
        ));
        assert!(matches!(
            Action::from_byte(0x94),
            Err(LayoutError::InvalidAction { .. })
        ));
    }

    #[test]
    fn parse_variants() {
        assert_eq!("none".parse::<Action>().unwrap(), Action::NoAct);
        assert_eq!("".parse::<Action>().unwrap(), Action::NoAct);
        assert_eq!("rel:+2".parse::<Action>().unwrap(), Action::Rel(2));
        assert_eq!("REL:-3".parse::<Action>().unwrap(), Action::Rel(-3));
        assert_eq!("-1".parse::<Action>().unwrap(), Action::Rel(-1));
        assert_eq!("+4".parse::<Action>().unwrap(), Action::Rel(4));
        assert_eq!("abs:7".parse::<Action>().unwrap(), Action::Abs(7));
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            "jump:2".parse::<Action>(),
            Err(LayoutError::ParseAction(_))
        ));
        assert!(matches!(
            "abs:x".parse::<Action>(),
            Err(LayoutError::ParseAction(_))
        ));
        assert!(matches!(
            "abs:-1".parse::<Action>(),
            Err(LayoutError::InvalidAction { .. })
        ));
    }

    #[test]
    fn parse_display_roundtrip() {
        for a in [Action::NoAct, Action::Rel(-5), Action::Rel(0), Action::Abs(9)] {
            assert_eq!(a.to_string().parse::<Action>().unwrap(), a);
        }
        assert_eq!(Action::Rel(0).to_string(), "rel:+0");
    }
}
