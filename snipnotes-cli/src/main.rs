//! `snipnotes`: terminal front-end over the Snipnotes core.
//!
//! Each invocation opens one session, loads the note table, runs one command
//! and prints the result.

mod command;
mod logging;
mod render;

use command::{Command, USAGE};
use snipnotes_core::{
    load_settings_from, open_gateway, save_settings_to, settings_file_path, Gateway, Language,
    NoteSession, SessionOptions, Settings, SnipnotesError,
};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let settings_path = settings_file_path();
    let settings = load_settings_from(&settings_path);
    if let Err(err) = settings.validate() {
        eprintln!("{}", err.user_message());
        return ExitCode::from(2);
    }

    let _logger = match logging::init_logging(&settings.log_level, settings.log_directory.as_deref()) {
        Ok(handle) => Some(handle),
        Err(message) => {
            eprintln!("logging disabled: {message}");
            None
        }
    };
    log::debug!("settings from {}", settings_path.display());

    match run(&command, &settings, &settings_path) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Command, settings: &Settings, settings_path: &Path) -> Result<String, SnipnotesError> {
    match command {
        Command::Languages => {
            return Ok(Language::ALL
                .iter()
                .map(|lang| format!("{:<12}{}\n", lang.as_str(), lang.label()))
                .collect());
        }
        Command::Config => {
            return Ok(format!(
                "{}\n{}\n",
                settings_path.display(),
                serde_json::to_string_pretty(settings)?
            ));
        }
        Command::ConfigInit => {
            save_settings_to(settings, settings_path)?;
            log::info!("wrote settings to {}", settings_path.display());
            return Ok(format!("wrote {}\n", settings_path.display()));
        }
        _ => {}
    }

    let gateway = open_gateway(settings)?;
    let session = NoteSession::with_options(gateway, SessionOptions::from(settings));
    session.load()?;
    execute(&session, command)
}

fn execute<G: Gateway>(session: &NoteSession<G>, command: &Command) -> Result<String, SnipnotesError> {
    let output = match command {
        Command::Tree => render::render_forest(&session.tree(), session.selected().as_deref()),
        Command::Show(id) => {
            let note = session
                .note(id)
                .ok_or_else(|| SnipnotesError::NoteNotFound(id.clone()))?;
            render::render_note(&note)
        }
        Command::Add(parent) => {
            let id = session.add_note(parent.as_deref())?;
            format!("{id}\n")
        }
        Command::Edit { id, patch } => {
            session.update_note(id, patch.clone())?;
            format!("updated {id}\n")
        }
        Command::Remove(id) => {
            let result = session.delete_note(id)?;
            format!("deleted {} note(s)\n", result.deleted_count)
        }
        Command::Copy(id) => {
            let report = session.copy_note(id)?;
            let mut out = format!("{}\n", report.root_id);
            if !report.is_complete() {
                out.push_str(&format!(
                    "warning: {} note(s) could not be copied: {}\n",
                    report.skipped.len(),
                    report.skipped.join(", ")
                ));
            }
            out
        }
        Command::Languages | Command::Config | Command::ConfigInit => USAGE.to_string(),
    };

    if command.is_mutation() {
        log::debug!("{} note(s) after {command:?}", session.len());
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snipnotes_core::{NotePatch, SqliteGateway};

    fn session() -> NoteSession<SqliteGateway> {
        let session = NoteSession::new(SqliteGateway::open_in_memory().unwrap());
        session.load().unwrap();
        session
    }

    #[test]
    fn test_add_edit_tree() {
        let session = session();
        let root = execute(&session, &Command::Add(None)).unwrap();
        let root = root.trim().to_string();
        execute(
            &session,
            &Command::Edit {
                id: root.clone(),
                patch: NotePatch::title("Shell"),
            },
        )
        .unwrap();
        execute(&session, &Command::Add(Some(root.clone()))).unwrap();

        let tree = execute(&session, &Command::Tree).unwrap();
        assert!(tree.starts_with(&format!("Shell [JavaScript] ({root})")));
        assert!(tree.contains("  > New Note"));
    }

    #[test]
    fn test_copy_and_remove() {
        let session = session();
        let root = execute(&session, &Command::Add(None)).unwrap().trim().to_string();
        let copy = execute(&session, &Command::Copy(root.clone())).unwrap();
        assert!(!copy.contains("warning"));
        assert_eq!(session.len(), 2);

        let out = execute(&session, &Command::Remove(root)).unwrap();
        assert_eq!(out, "deleted 1 note(s)\n");
    }

    #[test]
    fn test_config_init_writes_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snipnotes").join("settings.json");
        let settings = Settings {
            default_title: "Snippet".to_string(),
            default_language: Language::Bash,
            ..Settings::default()
        };

        let out = run(&Command::ConfigInit, &settings, &path).unwrap();
        assert_eq!(out, format!("wrote {}\n", path.display()));
        assert_eq!(load_settings_from(&path), settings);

        let shown = run(&Command::Config, &settings, &path).unwrap();
        assert!(shown.starts_with(&path.display().to_string()));
        assert!(shown.contains("\"defaultTitle\": \"Snippet\""));
    }

    #[test]
    fn test_show_unknown_note() {
        let session = session();
        let err = execute(&session, &Command::Show("nope".to_string())).unwrap_err();
        assert!(matches!(err, SnipnotesError::NoteNotFound(_)));
    }
}
