//! User-facing messages, in every supported language.
//!
//! Locales are YAML documents with a `code`, a display `name` and a `messages` map from message
//! id to template. Templates refer to arguments as `{Name}`.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Deserialize;

use crate::{Category, GenerateError, MAX_LENGTH, MIN_LENGTH};

pub const FALLBACK_LANGUAGE: &str = "en";

static EMBEDDED_LOCALES: &[(&str, &str)] = &[
    ("locales/en.yaml", include_str!("locales/en.yaml")),
    ("locales/ru.yaml", include_str!("locales/ru.yaml")),
];

/// Template arguments, by name.
pub type Args<'a> = [(&'a str, &'a dyn Display)];

#[derive(Debug, Deserialize)]
pub struct Locale {
    pub code: String,
    pub name: String,
    messages: BTreeMap<String, String>,
}

/// Every loaded locale, plus which one to fall back to.
#[derive(Debug)]
pub struct Catalog {
    locales: BTreeMap<String, Locale>,
    fallback: String,
}

impl Catalog {
    /// The locales compiled into the crate, falling back to English.
    pub fn embedded() -> Result<Catalog, LocaleError> {
        Catalog::from_documents(EMBEDDED_LOCALES.iter().copied(), FALLBACK_LANGUAGE)
    }

    /// Build a catalog from `(name, yaml)` pairs; `name` is only used in error messages.
    pub fn from_documents<'a, I>(documents: I, fallback: &str) -> Result<Catalog, LocaleError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut locales = BTreeMap::new();
        for (name, yaml) in documents {
            let locale = serde_yaml::from_str::<Locale>(yaml).map_err(|source| {
                LocaleError::Parse {
                    name: name.to_owned(),
                    source,
                }
            })?;
            let code = locale.code.clone();
            if locales.insert(code.clone(), locale).is_some() {
                return Err(LocaleError::DuplicateLanguage(code));
            }
        }
        if !locales.contains_key(fallback) {
            return Err(LocaleError::MissingFallback(fallback.to_owned()));
        }
        Ok(Catalog {
            locales,
            fallback: fallback.to_owned(),
        })
    }

    /// Every locale, ordered by language code.
    pub fn languages(&self) -> impl Iterator<Item = &Locale> {
        self.locales.values()
    }

    pub fn has_language(&self, code: &str) -> bool {
        self.locales.contains_key(code)
    }

    /// A localizer for `language`. Unknown languages get the fallback language.
    pub fn localizer(&self, language: &str) -> Localizer<'_> {
        let fallback = &self.locales[&self.fallback];
        Localizer {
            locale: self.locales.get(language).unwrap_or(fallback),
            fallback,
        }
    }
}

pub struct Localizer<'a> {
    locale: &'a Locale,
    fallback: &'a Locale,
}

impl<'a> Localizer<'a> {
    pub fn language(&self) -> &'a str {
        &self.locale.code
    }

    pub fn localize(&self, id: &str, args: &Args<'_>) -> Result<String, LocaleError> {
        let template = self
            .locale
            .messages
            .get(id)
            .or_else(|| self.fallback.messages.get(id))
            .ok_or_else(|| LocaleError::MissingMessage(id.to_owned(), self.locale.code.clone()))?;
        Ok(render(template, args))
    }

    /// Like [`Localizer::localize`], but a missing message renders as `[id]`.
    pub fn localize_or_id(&self, id: &str, args: &Args<'_>) -> String {
        self.localize(id, args)
            .unwrap_or_else(|_| format!("[{}]", id))
    }

    /// The user-facing text for a generation error.
    ///
    /// `Min`, `Max`, `Length` and `Category` are filled in from the error; `args` can add more.
    /// Errors without a message id are rendered with their `Display` text.
    pub fn localize_error(&self, err: &GenerateError, args: &Args<'_>) -> String {
        let id = match err.message_id() {
            Some(id) => id,
            None => return err.to_string(),
        };
        let category = match err {
            GenerateError::EmptyCategory(category) => self.category_name(*category),
            _ => String::new(),
        };
        let length = match err {
            GenerateError::LengthOutOfRange { length } => *length,
            _ => 0,
        };
        let from_error: [(&str, &dyn Display); 4] = [
            ("Min", &MIN_LENGTH),
            ("Max", &MAX_LENGTH),
            ("Length", &length),
            ("Category", &category),
        ];
        let mut all_args = from_error.to_vec();
        all_args.extend_from_slice(args);
        self.localize_or_id(id, &all_args)
    }

    pub fn category_name(&self, category: Category) -> String {
        let id = match category {
            Category::Uppercase => "category_uppercase",
            Category::Lowercase => "category_lowercase",
            Category::Digits => "category_digits",
            Category::SpecialSymbols => "category_special_symbols",
        };
        self.localize(id, &[])
            .unwrap_or_else(|_| category.name().to_owned())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LocaleError {
    #[error("failed to parse locale {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("language {0:?} is defined more than once")]
    DuplicateLanguage(String),
    #[error("there is no locale for the fallback language {0:?}")]
    MissingFallback(String),
    #[error("message {0:?} is missing from {1:?} and from the fallback language")]
    MissingMessage(String, String),
}

/// Substitute `{Name}` placeholders. Placeholders with no matching argument are kept as-is.
fn render(template: &str, args: &Args<'_>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let after_brace = &rest[start + 1..];
        let end = match after_brace.find('}') {
            Some(end) => end,
            None => {
                output.push_str(&rest[start..]);
                rest = "";
                break;
            }
        };
        let name = &after_brace[..end];
        match args.iter().find(|(arg_name, _)| *arg_name == name) {
            Some((_, value)) => output.push_str(&value.to_string()),
            None => output.push_str(&rest[start..start + end + 2]),
        }
        rest = &after_brace[end + 1..];
    }
    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_locales_load() {
        let catalog = Catalog::embedded().unwrap();
        let codes = catalog.languages().map(|l| l.code.as_str()).collect::<Vec<_>>();
        assert_eq!(codes, ["en", "ru"]);
        assert!(catalog.has_language("ru"));
        assert!(!catalog.has_language("de"));
    }

    #[test]
    fn embedded_locales_have_the_same_messages() {
        let catalog = Catalog::embedded().unwrap();
        let en = &catalog.locales["en"];
        for locale in catalog.languages() {
            let ids = locale.messages.keys().collect::<Vec<_>>();
            assert_eq!(ids, en.messages.keys().collect::<Vec<_>>(), "{}", locale.code);
        }
    }

    #[test]
    fn renders_arguments() {
        let catalog = Catalog::embedded().unwrap();
        let localizer = catalog.localizer("en");
        let text = localizer
            .localize("prompt_length", &[("Min", &4), ("Max", &35)])
            .unwrap();
        assert_eq!(text, "Enter a password length from 4 to 35.");
    }

    #[test]
    fn unknown_language_falls_back() {
        let catalog = Catalog::embedded().unwrap();
        let localizer = catalog.localizer("xx");
        assert_eq!(localizer.language(), "en");
        assert_eq!(
            localizer.localize("copied", &[]).unwrap(),
            "Copied to the clipboard."
        );
    }

    #[test]
    fn missing_message_falls_back_then_fails() {
        let en = "code: en\nname: English\nmessages:\n  hello: \"Hello, {Who}\"\n  bye: Bye\n";
        let de = "code: de\nname: Deutsch\nmessages:\n  hello: \"Hallo, {Who}\"\n";
        let catalog = Catalog::from_documents([("en", en), ("de", de)], "en").unwrap();
        let localizer = catalog.localizer("de");
        assert_eq!(localizer.localize("hello", &[("Who", &"Welt")]).unwrap(), "Hallo, Welt");
        assert_eq!(localizer.localize("bye", &[]).unwrap(), "Bye");
        assert!(matches!(
            localizer.localize("nope", &[]),
            Err(LocaleError::MissingMessage(..))
        ));
        assert_eq!(localizer.localize_or_id("nope", &[]), "[nope]");
    }

    #[test]
    fn catalog_needs_its_fallback() {
        let de = "code: de\nname: Deutsch\nmessages: {}\n";
        assert!(matches!(
            Catalog::from_documents([("de", de)], "en"),
            Err(LocaleError::MissingFallback(_))
        ));
        assert!(matches!(
            Catalog::from_documents([("a", de), ("b", de)], "de"),
            Err(LocaleError::DuplicateLanguage(_))
        ));
        assert!(matches!(
            Catalog::from_documents([("bad", "code: [")], "en"),
            Err(LocaleError::Parse { .. })
        ));
    }

    #[test]
    fn localizes_generation_errors() {
        let catalog = Catalog::embedded().unwrap();
        let en = catalog.localizer("en");
        let ru = catalog.localizer("ru");

        let err = GenerateError::LengthOutOfRange { length: 2 };
        assert_eq!(
            en.localize_error(&err, &[]),
            "The password length must be between 4 and 35 characters."
        );
        assert_eq!(
            ru.localize_error(&err, &[]),
            "Длина пароля должна быть от 4 до 35 символов."
        );
        assert_eq!(
            en.localize_error(&GenerateError::NoCategorySelected, &[]),
            "Select at least one character category."
        );
        assert_eq!(
            en.localize_error(&GenerateError::EmptyCategory(Category::SpecialSymbols), &[]),
            "There are no special symbols to choose from."
        );
    }

    #[test]
    fn random_source_errors_are_not_translated() {
        let catalog = Catalog::embedded().unwrap();
        let err = GenerateError::RandomSource(rand::Error::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "boom",
        )));
        let text = catalog.localizer("ru").localize_error(&err, &[]);
        assert_eq!(text, err.to_string());
    }

    #[test]
    fn render_edge_cases() {
        assert_eq!(render("{A} and {B}", &[("A", &1)]), "1 and {B}");
        assert_eq!(render("open { brace", &[]), "open { brace");
        assert_eq!(render("{A}{A}", &[("A", &"x")]), "xx");
        assert_eq!(render("", &[]), "");
    }
}
