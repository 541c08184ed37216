//! Commands managing a conversation's display language.

use anyhow::Context;

use pwgen::session::SessionStore;

use crate::{App, ProgError};

pub(crate) fn start(app: &App) -> Result<(), ProgError> {
    let localizer = app.localizer();
    if !console::user_attended() {
        println!("{}", localizer.localize_or_id("start_choose_language", &[]));
        return list_languages(app);
    }

    let code = crate::prompt::language(&app.catalog, &localizer)?;
    if let Err(err) = pwgen::session::set_language(&app.store, app.session, &code) {
        tracing::warn!(session = app.session, error = %err, "failed to store the chosen language");
    }

    let localizer = app.catalog.localizer(&code);
    println!("{}", localizer.localize_or_id("start_greeting", &[]));
    println!("{}", localizer.localize_or_id("start_commands", &[]));
    Ok(())
}

pub(crate) fn show_language(app: &App) -> Result<(), ProgError> {
    let localizer = app.localizer();
    println!(
        "{}",
        localizer.localize_or_id("current_language", &[("Language", &localizer.language())])
    );
    Ok(())
}

pub(crate) fn set_language(app: &App, code: &str) -> Result<(), ProgError> {
    if !app.catalog.has_language(code) {
        let localizer = app.localizer();
        return Err(ProgError::InvalidRequest(
            localizer.localize_or_id("unknown_language", &[("Language", &code)]),
        ));
    }
    pwgen::session::set_language(&app.store, app.session, code)?;
    tracing::info!(session = app.session, language = code, "language changed");
    let localizer = app.catalog.localizer(code);
    println!(
        "{}",
        localizer.localize_or_id("language_set", &[("Language", &code)])
    );
    Ok(())
}

pub(crate) fn clear_session(app: &App) -> Result<(), ProgError> {
    let localizer = app.localizer();
    app.store.delete(app.session)?;
    println!("{}", localizer.localize_or_id("language_cleared", &[]));
    Ok(())
}

pub(crate) fn list_languages(app: &App) -> Result<(), ProgError> {
    let localizer = app.localizer();
    let current = localizer.language();
    let rows = app
        .catalog
        .languages()
        .map(|locale| crate::table::LanguageRow {
            code: &locale.code,
            name: &locale.name,
            current: locale.code == current,
        })
        .collect::<Vec<_>>();
    let headers = [
        localizer.localize_or_id("column_code", &[]),
        localizer.localize_or_id("column_language", &[]),
    ];
    crate::table::display_languages(&headers, &rows, std::io::stdout())
        .context("failed to output table")?;
    Ok(())
}
