//! Interactive prompts, used when a command is run from a terminal without all of its arguments.

use anyhow::Context;
use dialoguer::theme::ColorfulTheme;

use pwgen::i18n::{Catalog, Localizer};
use pwgen::{Category, CategoryFlags, MAX_LENGTH, MIN_LENGTH};

use crate::ProgError;

pub(crate) fn length(localizer: &Localizer<'_>) -> Result<usize, ProgError> {
    let limits = crate::generate::limits();
    let out_of_range = localizer.localize_or_id("prompt_length", &limits);
    let length = dialoguer::Input::<usize>::with_theme(&ColorfulTheme::default())
        .with_prompt(localizer.localize_or_id("prompt_length_input", &limits))
        .validate_with(move |length: &usize| -> Result<(), String> {
            if (MIN_LENGTH..=MAX_LENGTH).contains(length) {
                Ok(())
            } else {
                Err(out_of_range.clone())
            }
        })
        .interact_text()
        .context("failed to read the password length")?;
    Ok(length)
}

pub(crate) fn categories(localizer: &Localizer<'_>) -> Result<CategoryFlags, ProgError> {
    let names = Category::ALL
        .iter()
        .map(|category| localizer.category_name(*category))
        .collect::<Vec<_>>();
    let selected = dialoguer::MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt(localizer.localize_or_id("prompt_categories", &[]))
        .items(&names)
        .defaults(&[true; 4])
        .interact()
        .context("failed to query your selection")?;

    let mut flags = CategoryFlags::default();
    for index in selected {
        flags.enable(Category::ALL[index]);
    }
    flags.exclude_similar = dialoguer::Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(localizer.localize_or_id("prompt_exclude_similar", &[]))
        .default(false)
        .interact()
        .context("failed to prompt you, somehow")?;
    Ok(flags)
}

/// Returns the code of the chosen language.
pub(crate) fn language(catalog: &Catalog, localizer: &Localizer<'_>) -> Result<String, ProgError> {
    let locales = catalog.languages().collect::<Vec<_>>();
    let items = locales
        .iter()
        .map(|locale| format!("{} ({})", locale.name, locale.code))
        .collect::<Vec<_>>();
    let current = locales
        .iter()
        .position(|locale| locale.code == localizer.language())
        .unwrap_or(0);
    let selection = dialoguer::Select::with_theme(&ColorfulTheme::default())
        .with_prompt(localizer.localize_or_id("start_choose_language", &[]))
        .items(&items)
        .default(current)
        .interact_opt()
        .context("failed to query your selection")?
        .ok_or(ProgError::SelectionCancelled)?;
    Ok(locales[selection].code.clone())
}
