use std::fmt::Display;

use anyhow::Context;
use rand::rngs::OsRng;

use pwgen::i18n::Localizer;
use pwgen::password_generation::generate_with_rng;
use pwgen::{CategoryFlags, MAX_LENGTH, MIN_LENGTH};

use crate::{App, ProgError};

pub(crate) fn generate(
    app: &App,
    length: Option<String>,
    flags: Option<String>,
    copy: bool,
) -> Result<(), ProgError> {
    let localizer = app.localizer();
    let (remembered_length, remembered_flags) = app.remembered_request();
    let attended = console::user_attended();

    let length = match length {
        Some(text) => parse_length(&text, &localizer)?,
        None => match remembered_length {
            Some(length) => length,
            None if attended => crate::prompt::length(&localizer)?,
            None => return Err(missing_arguments(&localizer)),
        },
    };
    let flags = match flags {
        Some(letters) => CategoryFlags::from_letters(&letters),
        None => match remembered_flags {
            Some(flags) => flags,
            None if attended => crate::prompt::categories(&localizer)?,
            None => return Err(missing_arguments(&localizer)),
        },
    };

    tracing::debug!(length, flags = %flags.to_letters(), "generating password");
    let password = match generate_with_rng(&mut OsRng, &app.config.character_sets(), length, flags)
    {
        Ok(password) => password,
        Err(err) if err.is_validation() => {
            tracing::debug!(error = %err, "rejected generation request");
            return Err(ProgError::InvalidRequest(
                localizer.localize_error(&err, &[]),
            ));
        }
        Err(err) => return Err(ProgError::Generate(err)),
    };

    if let Err(err) = pwgen::session::remember_request(&app.store, app.session, length, flags) {
        tracing::warn!(session = app.session, error = %err, "failed to remember the request");
    }

    if copy {
        crate::clipboard::send_to_clipboard(password.as_str().as_bytes())
            .context("failed to copy the password to the clipboard")?;
        eprintln!("{}", localizer.localize_or_id("copied", &[]));
    } else {
        let styled = console::style(password.as_str()).bold();
        println!(
            "{}",
            localizer.localize_or_id("generation_success", &[("Password", &styled)])
        );
    }
    Ok(())
}

/// Only checks that `text` is a number; the range is the generator's business.
fn parse_length(text: &str, localizer: &Localizer<'_>) -> Result<usize, ProgError> {
    text.trim()
        .parse::<usize>()
        .map_err(|_| ProgError::InvalidRequest(localizer.localize_or_id("prompt_length", &limits())))
}

fn missing_arguments(localizer: &Localizer<'_>) -> ProgError {
    ProgError::InvalidRequest(format!(
        "{}\n{}",
        localizer.localize_or_id("prompt_length", &limits()),
        localizer.localize_or_id("prompt_flags", &[]),
    ))
}

pub(crate) fn limits() -> [(&'static str, &'static dyn Display); 2] {
    [("Min", &MIN_LENGTH), ("Max", &MAX_LENGTH)]
}

#[cfg(test)]
mod tests {
    use pwgen::i18n::Catalog;

    use super::*;

    #[test]
    fn parses_lengths() {
        let catalog = Catalog::embedded().unwrap();
        let localizer = catalog.localizer("en");
        assert_eq!(parse_length("12", &localizer).unwrap(), 12);
        assert_eq!(parse_length(" 40 ", &localizer).unwrap(), 40);
        match parse_length("twelve", &localizer) {
            Err(ProgError::InvalidRequest(text)) => {
                assert_eq!(text, "Enter a password length from 4 to 35.")
            }
            _ => panic!("expected an invalid request"),
        }
    }

    #[test]
    fn missing_arguments_prompts_for_both() {
        let catalog = Catalog::embedded().unwrap();
        let localizer = catalog.localizer("ru");
        match missing_arguments(&localizer) {
            ProgError::InvalidRequest(text) => {
                assert!(text.starts_with("Введите длину пароля от 4 до 35."));
                assert!(text.contains("Выберите категории символов"));
            }
            _ => panic!("expected an invalid request"),
        }
    }
}
