//! Identifiers arrive from the backend and from form state as numbers, numeric strings or `null`.
//! Everything is funneled through [`normalize`] before it is used in a request.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Returns the finite non-negative integer `value` denotes, if any.
#[must_use]
pub fn normalize(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => {
            if let Some(unsigned) = number.as_u64() {
                return u32::try_from(unsigned).ok();
            }
            if number.is_i64() {
                return None;
            }
            number.as_f64().and_then(from_float)
        }
        Value::String(text) => parse(text),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Same rules as [`normalize`] for text coming out of a form field.
#[must_use]
pub fn parse(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = text.parse::<u32>() {
        return Some(value);
    }
    text.parse::<f64>().ok().and_then(from_float)
}

fn from_float(value: f64) -> Option<u32> {
    if value.is_finite() && value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value) {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "range and integrality are checked above"
        )]
        let value = value as u32;
        Some(value)
    } else {
        None
    }
}

pub trait Identifier: Copy {
    fn from_raw(raw: u32) -> Self;
}

/// For `Option<Id>` fields: anything that does not normalize becomes `None`.
pub fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Identifier,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(normalize).map(T::from_raw))
}

macro_rules! id_type {
    ( $( $(#[$meta:meta])* $name:ident ),+ $(,)? ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
            #[serde(transparent)]
            pub struct $name(pub u32);

            impl $name {
                #[must_use]
                pub fn normalize(value: &Value) -> Option<Self> {
                    normalize(value).map(Self)
                }

                #[must_use]
                pub const fn get(self) -> u32 {
                    self.0
                }
            }

            impl Identifier for $name {
                fn from_raw(raw: u32) -> Self {
                    Self(raw)
                }
            }

            impl From<u32> for $name {
                fn from(raw: u32) -> Self {
                    Self(raw)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Display::fmt(&self.0, f)
                }
            }

            impl<'de> Deserialize<'de> for $name {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let value = Value::deserialize(deserializer)?;
                    Self::normalize(&value).ok_or_else(|| {
                        serde::de::Error::custom(format!(
                            "invalid {}: {value}",
                            stringify!($name)
                        ))
                    })
                }
            }
        )+
    };
}

id_type! {
    /// `idEtude`
    StudyId,
    /// `idGroupe`
    GroupId,
    /// `idVol` / `idVolontaire`
    VolunteerId,
    /// `idRdv`, only unique within a study
    AppointmentId,
    /// `idAnnuler`
    CancellationId,
}
