//! Device UI mode
//!
//! The OS reports an interaction-mode classification for the device
//! (normal, television, car, ...). Sources are queried on every call; the
//! bridge never caches the answer.

use std::str::FromStr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// UI mode classification, numbered like Android's
/// `Configuration.UI_MODE_TYPE_*` constants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum UiModeType {
    #[default]
    Undefined = 0,
    Normal = 1,
    Desk = 2,
    Car = 3,
    Television = 4,
    Appliance = 5,
    Watch = 6,
    VrHeadset = 7,
}

impl UiModeType {
    pub const ALL: [UiModeType; 8] = [
        UiModeType::Undefined,
        UiModeType::Normal,
        UiModeType::Desk,
        UiModeType::Car,
        UiModeType::Television,
        UiModeType::Appliance,
        UiModeType::Watch,
        UiModeType::VrHeadset,
    ];

    /// Map a raw OS constant. Unknown values map to `Undefined`.
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            1 => UiModeType::Normal,
            2 => UiModeType::Desk,
            3 => UiModeType::Car,
            4 => UiModeType::Television,
            5 => UiModeType::Appliance,
            6 => UiModeType::Watch,
            7 => UiModeType::VrHeadset,
            _ => UiModeType::Undefined,
        }
    }

    /// The raw OS constant.
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    pub const fn is_television(self) -> bool {
        matches!(self, UiModeType::Television)
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            UiModeType::Undefined => "undefined",
            UiModeType::Normal => "normal",
            UiModeType::Desk => "desk",
            UiModeType::Car => "car",
            UiModeType::Television => "television",
            UiModeType::Appliance => "appliance",
            UiModeType::Watch => "watch",
            UiModeType::VrHeadset => "vr_headset",
        }
    }
}

impl std::fmt::Display for UiModeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UiModeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if normalized == "tv" {
            return Ok(UiModeType::Television);
        }
        UiModeType::ALL
            .into_iter()
            .find(|mode| mode.name() == normalized)
            .ok_or_else(|| format!("unknown UI mode '{}'", s))
    }
}

/// Something that can report the device's current UI mode.
pub trait UiModeSource: Send + Sync {
    /// Query the current UI mode.
    fn current_mode_type(&self) -> Result<UiModeType>;
}

impl<T: UiModeSource + ?Sized> UiModeSource for &T {
    fn current_mode_type(&self) -> Result<UiModeType> {
        (**self).current_mode_type()
    }
}

impl<T: UiModeSource + ?Sized> UiModeSource for Box<T> {
    fn current_mode_type(&self) -> Result<UiModeType> {
        (**self).current_mode_type()
    }
}

impl<T: UiModeSource + ?Sized> UiModeSource for Arc<T> {
    fn current_mode_type(&self) -> Result<UiModeType> {
        (**self).current_mode_type()
    }
}

/// A source that always reports the same mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedUiMode(pub UiModeType);

impl UiModeSource for FixedUiMode {
    fn current_mode_type(&self) -> Result<UiModeType> {
        Ok(self.0)
    }
}

/// A source whose mode can be switched at runtime, e.g. to simulate a
/// device being docked.
#[derive(Clone, Debug, Default)]
pub struct SharedUiMode {
    raw: Arc<AtomicI32>,
}

impl SharedUiMode {
    pub fn new(mode: UiModeType) -> Self {
        Self {
            raw: Arc::new(AtomicI32::new(mode.as_raw())),
        }
    }

    pub fn set(&self, mode: UiModeType) {
        self.raw.store(mode.as_raw(), Ordering::Release);
    }

    pub fn get(&self) -> UiModeType {
        UiModeType::from_raw(self.raw.load(Ordering::Acquire))
    }
}

impl UiModeSource for SharedUiMode {
    fn current_mode_type(&self) -> Result<UiModeType> {
        Ok(self.get())
    }
}

/// A source that has no UI mode service to ask.
#[derive(Clone, Debug)]
pub struct UnavailableUiMode {
    reason: String,
}

impl UnavailableUiMode {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl UiModeSource for UnavailableUiMode {
    fn current_mode_type(&self) -> Result<UiModeType> {
        Err(BridgeError::ServiceUnavailable(self.reason.clone()))
    }
}

/// Asks `primary` first and falls back to `secondary` if it fails.
#[derive(Clone, Debug)]
pub struct FallbackUiMode<A, B> {
    primary: A,
    secondary: B,
}

impl<A: UiModeSource, B: UiModeSource> FallbackUiMode<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: UiModeSource, B: UiModeSource> UiModeSource for FallbackUiMode<A, B> {
    fn current_mode_type(&self) -> Result<UiModeType> {
        match self.primary.current_mode_type() {
            Ok(mode) => Ok(mode),
            Err(e) => {
                tracing::debug!("primary UI mode source failed, using fallback: {}", e);
                self.secondary.current_mode_type()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_prefers_primary() {
        let source = FallbackUiMode::new(
            FixedUiMode(UiModeType::Television),
            FixedUiMode(UiModeType::Normal),
        );
        assert_eq!(source.current_mode_type().unwrap(), UiModeType::Television);
    }

    #[test]
    fn test_fallback_on_primary_failure() {
        let source = FallbackUiMode::new(
            UnavailableUiMode::new("no service"),
            FixedUiMode(UiModeType::Television),
        );
        assert_eq!(source.current_mode_type().unwrap(), UiModeType::Television);

        let both_down = FallbackUiMode::new(
            UnavailableUiMode::new("no service"),
            UnavailableUiMode::new("no configuration"),
        );
        assert!(matches!(
            both_down.current_mode_type(),
            Err(BridgeError::ServiceUnavailable(reason)) if reason == "no configuration"
        ));
    }

    #[test]
    fn test_raw_constants_match_android() {
        assert_eq!(UiModeType::Undefined.as_raw(), 0);
        assert_eq!(UiModeType::Normal.as_raw(), 1);
        assert_eq!(UiModeType::Television.as_raw(), 4);
        assert_eq!(UiModeType::VrHeadset.as_raw(), 7);

        for mode in UiModeType::ALL {
            assert_eq!(UiModeType::from_raw(mode.as_raw()), mode);
        }
        assert_eq!(UiModeType::from_raw(15), UiModeType::Undefined);
        assert_eq!(UiModeType::from_raw(-1), UiModeType::Undefined);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("television".parse::<UiModeType>(), Ok(UiModeType::Television));
        assert_eq!("TV".parse::<UiModeType>(), Ok(UiModeType::Television));
        assert_eq!("vr-headset".parse::<UiModeType>(), Ok(UiModeType::VrHeadset));
        assert_eq!(" normal ".parse::<UiModeType>(), Ok(UiModeType::Normal));
        assert!("phone".parse::<UiModeType>().is_err());
    }

    #[test]
    fn test_only_television_is_television() {
        let tv: Vec<_> = UiModeType::ALL
            .into_iter()
            .filter(|m| m.is_television())
            .collect();
        assert_eq!(tv, vec![UiModeType::Television]);
    }

    #[test]
    fn test_shared_mode_switches() {
        let source = SharedUiMode::new(UiModeType::Normal);
        let handle = source.clone();
        assert_eq!(source.current_mode_type().unwrap(), UiModeType::Normal);

        handle.set(UiModeType::Television);
        assert_eq!(source.current_mode_type().unwrap(), UiModeType::Television);
    }

    #[test]
    fn test_unavailable_source_errors() {
        let source = UnavailableUiMode::new("no service");
        assert!(matches!(
            source.current_mode_type(),
            Err(BridgeError::ServiceUnavailable(reason)) if reason == "no service"
        ));
    }
}
