//! Random password generation with a per-category coverage guarantee, along with the session
//! store and message catalog used by the `pwgen` front end.

pub mod i18n;
pub mod password_generation;
pub mod session;

pub use password_generation::{
    generate, Category, CategoryFlags, CharacterSets, GenerateError, MAX_LENGTH, MIN_LENGTH,
};

/// A generated password. `Debug` output never shows the contents.
#[derive(Clone, Eq, PartialEq)]
pub struct Secret(String);

opaque_debug::implement!(Secret);

impl Secret {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters (not bytes; some special symbols are multi-byte).
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Secret {
        Secret(s)
    }
}
