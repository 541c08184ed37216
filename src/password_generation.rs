//! Utilities for generating passwords.
//!
//! A password is built from the character categories the caller enables. Every enabled category
//! contributes at least one character; the remaining positions are sampled from the union of the
//! enabled categories, and the whole result is then shuffled so the guaranteed characters don't
//! sit at predictable positions.

use std::fmt;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// The shortest password [`generate`] will produce.
pub const MIN_LENGTH: usize = 4;
/// The longest password [`generate`] will produce.
pub const MAX_LENGTH: usize = 35;

static UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
static LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
static DIGITS: &str = "0123456789";
static SPECIAL_SYMBOLS: &str = "!@#№$;%^:&?*()-_=+[]{}<>.,/|`~";
static SIMILAR: &str = "il1O0";

/// A named class of characters, treated as a unit for the coverage guarantee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Uppercase,
    Lowercase,
    Digits,
    SpecialSymbols,
}

impl Category {
    /// Every category, in the order they contribute their guaranteed character.
    pub const ALL: [Category; 4] = [
        Category::Uppercase,
        Category::Lowercase,
        Category::Digits,
        Category::SpecialSymbols,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Uppercase => "uppercase",
            Category::Lowercase => "lowercase",
            Category::Digits => "digits",
            Category::SpecialSymbols => "special symbols",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which categories a password should draw from.
///
/// `exclude_similar` is a modifier: on its own it doesn't select anything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CategoryFlags {
    #[serde(default)]
    pub uppercase: bool,
    #[serde(default)]
    pub lowercase: bool,
    #[serde(default)]
    pub digits: bool,
    #[serde(default)]
    pub special: bool,
    #[serde(default)]
    pub exclude_similar: bool,
}

impl CategoryFlags {
    /// All four content categories, without excluding similar characters.
    pub fn all() -> CategoryFlags {
        CategoryFlags {
            uppercase: true,
            lowercase: true,
            digits: true,
            special: true,
            exclude_similar: false,
        }
    }

    /// Parse the flag letters used on the command line: `U`ppercase, `L`owercase, `D`igits,
    /// `S`pecial symbols and e`X`clude similar characters. Case doesn't matter, and unknown
    /// letters are ignored.
    pub fn from_letters(letters: &str) -> CategoryFlags {
        let mut flags = CategoryFlags::default();
        for c in letters.chars() {
            match c.to_ascii_uppercase() {
                'U' => flags.uppercase = true,
                'L' => flags.lowercase = true,
                'D' => flags.digits = true,
                'S' => flags.special = true,
                'X' => flags.exclude_similar = true,
                _ => (),
            }
        }
        flags
    }

    /// The inverse of [`CategoryFlags::from_letters`], in canonical order.
    pub fn to_letters(&self) -> String {
        let mut letters = String::new();
        for (enabled, letter) in [
            (self.uppercase, 'U'),
            (self.lowercase, 'L'),
            (self.digits, 'D'),
            (self.special, 'S'),
            (self.exclude_similar, 'X'),
        ] {
            if enabled {
                letters.push(letter);
            }
        }
        letters
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::Uppercase => self.uppercase,
            Category::Lowercase => self.lowercase,
            Category::Digits => self.digits,
            Category::SpecialSymbols => self.special,
        }
    }

    pub fn enable(&mut self, category: Category) {
        match category {
            Category::Uppercase => self.uppercase = true,
            Category::Lowercase => self.lowercase = true,
            Category::Digits => self.digits = true,
            Category::SpecialSymbols => self.special = true,
        }
    }

    /// The enabled categories, in the order of [`Category::ALL`].
    pub fn enabled(&self) -> impl Iterator<Item = Category> {
        let flags = *self;
        Category::ALL
            .into_iter()
            .filter(move |category| flags.is_enabled(*category))
    }

    /// Whether at least one content category is enabled.
    pub fn has_any(&self) -> bool {
        self.enabled().next().is_some()
    }
}

/// The character tables passwords are assembled from.
///
/// [`CharacterSets::standard`] is what [`generate`] uses; other tables are only useful to
/// callers who need a different special-symbol alphabet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterSets {
    uppercase: Vec<char>,
    lowercase: Vec<char>,
    digits: Vec<char>,
    special: Vec<char>,
    similar: Vec<char>,
}

impl CharacterSets {
    pub fn standard() -> CharacterSets {
        CharacterSets::new(UPPERCASE, LOWERCASE, DIGITS, SPECIAL_SYMBOLS, SIMILAR)
    }

    pub fn new(
        uppercase: &str,
        lowercase: &str,
        digits: &str,
        special: &str,
        similar: &str,
    ) -> CharacterSets {
        CharacterSets {
            uppercase: uppercase.chars().collect(),
            lowercase: lowercase.chars().collect(),
            digits: digits.chars().collect(),
            special: special.chars().collect(),
            similar: similar.chars().collect(),
        }
    }

    /// Replace the special-symbol table, keeping everything else.
    pub fn with_special_symbols(mut self, special: &str) -> CharacterSets {
        self.special = special.chars().collect();
        self
    }

    pub fn category(&self, category: Category) -> &[char] {
        match category {
            Category::Uppercase => &self.uppercase,
            Category::Lowercase => &self.lowercase,
            Category::Digits => &self.digits,
            Category::SpecialSymbols => &self.special,
        }
    }

    /// Whether `ch` is one of the visually ambiguous characters.
    pub fn is_similar(&self, ch: char) -> bool {
        self.similar.contains(&ch)
    }

    /// The category `ch` belongs to, if any.
    pub fn category_of(&self, ch: char) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| self.category(*category).contains(&ch))
    }
}

impl Default for CharacterSets {
    fn default() -> CharacterSets {
        CharacterSets::standard()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(
        "a password of length {length} cannot be generated; the length must be between {min} and \
         {max}, and no shorter than the number of selected categories",
        min = MIN_LENGTH,
        max = MAX_LENGTH
    )]
    LengthOutOfRange { length: usize },
    #[error("no character category was selected")]
    NoCategorySelected,
    #[error("the {0} category has no characters to choose from")]
    EmptyCategory(Category),
    #[error("the secure random source failed: {0}")]
    RandomSource(#[source] rand::Error),
}

impl GenerateError {
    /// A stable identifier for the error, for mapping it to a user-facing message.
    ///
    /// Random source failures have none: they aren't something a user can fix by changing their
    /// request.
    pub fn message_id(&self) -> Option<&'static str> {
        match self {
            GenerateError::LengthOutOfRange { .. } => Some("length_out_of_range"),
            GenerateError::NoCategorySelected => Some("no_category_selected"),
            GenerateError::EmptyCategory(_) => Some("empty_category"),
            GenerateError::RandomSource(_) => None,
        }
    }

    /// `true` if the request itself was bad, `false` if the random source failed.
    pub fn is_validation(&self) -> bool {
        !matches!(self, GenerateError::RandomSource(_))
    }
}

impl From<rand::Error> for GenerateError {
    fn from(err: rand::Error) -> GenerateError {
        GenerateError::RandomSource(err)
    }
}

/// Generate a password of `length` characters from the standard tables, using the operating
/// system's random source.
pub fn generate(length: usize, flags: CategoryFlags) -> Result<crate::Secret, GenerateError> {
    generate_with_rng(&mut OsRng, &CharacterSets::standard(), length, flags)
}

/// Generate a password of `length` characters from `sets`.
///
/// Every category enabled in `flags` appears at least once. If `flags.exclude_similar` is set,
/// none of the similar characters of `sets` appear at all.
pub fn generate_with_rng<R>(
    rng: &mut R,
    sets: &CharacterSets,
    length: usize,
    flags: CategoryFlags,
) -> Result<crate::Secret, GenerateError>
where
    R: RngCore + CryptoRng,
{
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
        return Err(GenerateError::LengthOutOfRange { length });
    }
    if !flags.has_any() {
        return Err(GenerateError::NoCategorySelected);
    }

    let mut required = Vec::with_capacity(Category::ALL.len());
    let mut pool = Vec::new();
    for category in flags.enabled() {
        let chars = sets
            .category(category)
            .iter()
            .copied()
            .filter(|&ch| !(flags.exclude_similar && sets.is_similar(ch)))
            .collect::<Vec<_>>();
        if chars.is_empty() {
            return Err(GenerateError::EmptyCategory(category));
        }
        pool.extend_from_slice(&chars);
        required.push(chars);
    }
    if required.len() > length {
        return Err(GenerateError::LengthOutOfRange { length });
    }

    let mut password = Vec::with_capacity(length);
    for chars in required.iter() {
        password.push(chars[random_index(rng, chars.len())?]);
    }
    while password.len() < length {
        password.push(pool[random_index(rng, pool.len())?]);
    }
    shuffle(rng, &mut password)?;

    Ok(crate::Secret(password.into_iter().collect()))
}

/// Draw an index uniformly from `0..bound`.
///
/// 32-bit draws falling in the incomplete final multiple of `bound` are rejected and redrawn, so
/// there is no modulo bias. `rand`'s own samplers do the same, but they panic when `OsRng` fails;
/// going through `try_fill_bytes` hands that failure back to the caller instead.
///
/// Panics if `bound` is zero or larger than 2^32.
fn random_index<R>(rng: &mut R, bound: usize) -> Result<usize, rand::Error>
where
    R: RngCore + ?Sized,
{
    const RANGE: u64 = 1 << 32;
    assert!(bound > 0, "cannot draw an index from an empty range");
    let bound = bound as u64;
    assert!(bound <= RANGE, "index bound too large");

    let zone = RANGE - RANGE % bound;
    loop {
        let mut buf = [0u8; 4];
        rng.try_fill_bytes(&mut buf)?;
        let value = u64::from(u32::from_le_bytes(buf));
        if value < zone {
            return Ok((value % bound) as usize);
        }
    }
}

/// Fisher-Yates, with every swap partner drawn by [`random_index`].
fn shuffle<R, T>(rng: &mut R, items: &mut [T]) -> Result<(), rand::Error>
where
    R: RngCore + ?Sized,
{
    for i in (1..items.len()).rev() {
        let j = random_index(rng, i + 1)?;
        items.swap(i, j);
    }
    Ok(())
}
