//! Identifier types for WestPay.
//!
//! Every identifier ends up as a segment of a hosted-store path, so all of
//! them share the store's key rules: non-empty, and free of `.`, `#`, `$`,
//! `[`, `]` and `/`.
//!
//! # Macro-based ID Types
//!
//! The `string_id_type!` macro reduces boilerplate for string-backed identifier types,
//! ensuring consistent implementation of serialization, parsing, and display traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Characters the hosted store rejects inside a key.
pub const FORBIDDEN_KEY_CHARS: [char; 6] = ['.', '#', '$', '[', ']', '/'];

/// Check that `s` is usable as a single store key.
///
/// # Errors
///
/// Returns [`IdError::Empty`] or [`IdError::InvalidCharacter`].
pub fn validate_key(s: &str) -> Result<(), IdError> {
    if s.is_empty() {
        return Err(IdError::Empty);
    }
    if let Some(c) = s.chars().find(|c| FORBIDDEN_KEY_CHARS.contains(c) || c.is_control()) {
        return Err(IdError::InvalidCharacter(c));
    }
    Ok(())
}

/// Macro to define a string-backed identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `String` with implementations for:
/// - `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Serialize`, `Deserialize` (validated on the way in)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<String>`, `Into<String>`, `AsRef<str>`
macro_rules! string_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create an identifier, validating it as a store key.
            ///
            /// # Errors
            ///
            /// Returns an error if the value is empty or contains a forbidden character.
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                let value = value.into();
                validate_key(&value)?;
                Ok(Self(value))
            }

            /// Return the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id_type!(UserId, "A user identifier issued by the hosted auth service.");
string_id_type!(
    PushKey,
    "A unique, ordering-friendly key for a child record.\n\nGenerated keys are ULIDs, so lexical order follows creation time. Keys read back from the store may come from other writers and are accepted as long as they are valid store keys."
);

impl PushKey {
    /// Generate a new time-ordered push key.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }
}

/// A store key derived from an e-mail address.
///
/// Used to address messages for visitors that have no user record:
/// `.` becomes `_` and `@` becomes `_at_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailKey(String);

impl EmailKey {
    /// Derive the key for an e-mail address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty or still contains a forbidden
    /// character after substitution.
    pub fn from_email(email: &str) -> Result<Self, IdError> {
        let key = email.trim().replace('.', "_").replace('@', "_at_");
        validate_key(&key)?;
        Ok(Self(key))
    }

    /// Return the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is empty.
    #[error("identifier is empty")]
    Empty,

    /// The input contains a character the store rejects in keys.
    #[error("identifier contains forbidden character {0:?}")]
    InvalidCharacter(char),
}
