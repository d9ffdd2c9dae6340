//! Typed signal values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The value type a signal carries on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Int,
    String,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::String => "string",
        };
        f.write_str(name)
    }
}

/// A value written to, or observed on, a single signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl SignalValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            SignalValue::Bool(_) => ValueType::Bool,
            SignalValue::Int(_) => ValueType::Int,
            SignalValue::String(_) => ValueType::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SignalValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Bool(b) => write!(f, "{b}"),
            SignalValue::Int(i) => write!(f, "{i}"),
            SignalValue::String(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<bool> for SignalValue {
    fn from(value: bool) -> Self {
        SignalValue::Bool(value)
    }
}

impl From<i64> for SignalValue {
    fn from(value: i64) -> Self {
        SignalValue::Int(value)
    }
}

impl From<i32> for SignalValue {
    fn from(value: i32) -> Self {
        SignalValue::Int(i64::from(value))
    }
}

impl From<&str> for SignalValue {
    fn from(value: &str) -> Self {
        SignalValue::String(value.to_string())
    }
}

impl From<String> for SignalValue {
    fn from(value: String) -> Self {
        SignalValue::String(value)
    }
}

// ---------------------------------------------------------------------------
// Interior light modes
// ---------------------------------------------------------------------------

/// Animation modes of the interior ambient light.
///
/// The light controller takes the mode as a string holding the decimal
/// discriminant, so `NightRider` travels on the bus as `"1"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightMode {
    Off = 0,
    NightRider = 1,
    Rainbow = 2,
    FadeIn = 3,
}

impl LightMode {
    /// Parse the bus encoding back into a mode.
    pub fn from_encoded(encoded: &str) -> Option<Self> {
        match encoded {
            "0" => Some(LightMode::Off),
            "1" => Some(LightMode::NightRider),
            "2" => Some(LightMode::Rainbow),
            "3" => Some(LightMode::FadeIn),
            _ => None,
        }
    }
}

impl From<LightMode> for SignalValue {
    fn from(mode: LightMode) -> Self {
        SignalValue::String((mode as u8).to_string())
    }
}
