//! Command-line parsing for the `snipnotes` binary.

use snipnotes_core::{Language, NotePatch};
use std::path::PathBuf;

pub const USAGE: &str = "\
usage: snipnotes <command> [args]

commands:
  tree                      print the note tree
  show <id>                 print one note with its code
  add [parent-id]           add a note at root or under a parent
  edit <id> [--title T] [--code C | --code-file PATH] [--comment C] [--language L]
  rm <id>                   delete a note and all notes below it
  cp <id>                   copy a note and its subtree next to the original
  languages                 list supported languages
  config                    print the settings file location and contents
  config init               write the effective settings to the settings file";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Tree,
    Show(String),
    Add(Option<String>),
    Edit { id: String, patch: NotePatch },
    Remove(String),
    Copy(String),
    Languages,
    Config,
    ConfigInit,
}

impl Command {
    /// Parses the arguments after the program name.
    pub fn parse<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let name = args.next().ok_or_else(|| USAGE.to_string())?;
        let rest: Vec<String> = args.collect();

        let command = match name.as_str() {
            "tree" => Self::Tree,
            "show" => Self::Show(single_id(&name, &rest)?),
            "add" => match rest.as_slice() {
                [] => Self::Add(None),
                [parent] => Self::Add(Some(parent.clone())),
                _ => return Err(format!("`add` takes at most one parent id\n\n{USAGE}")),
            },
            "edit" => parse_edit(&rest)?,
            "rm" => Self::Remove(single_id(&name, &rest)?),
            "cp" => Self::Copy(single_id(&name, &rest)?),
            "languages" => Self::Languages,
            "config" => match rest.as_slice() {
                [] => Self::Config,
                [sub] if sub == "init" => Self::ConfigInit,
                _ => return Err(format!("unknown `config` arguments\n\n{USAGE}")),
            },
            "-h" | "--help" | "help" => return Err(USAGE.to_string()),
            other => return Err(format!("unknown command `{other}`\n\n{USAGE}")),
        };
        Ok(command)
    }

    /// Whether the command writes to the note table.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Add(_) | Self::Edit { .. } | Self::Remove(_) | Self::Copy(_)
        )
    }
}

fn single_id(name: &str, rest: &[String]) -> Result<String, String> {
    match rest {
        [id] => Ok(id.clone()),
        _ => Err(format!("`{name}` takes exactly one note id\n\n{USAGE}")),
    }
}

fn parse_edit(rest: &[String]) -> Result<Command, String> {
    let (id, flags) = rest
        .split_first()
        .ok_or_else(|| format!("`edit` needs a note id\n\n{USAGE}"))?;

    let mut patch = NotePatch::default();
    let mut code_file: Option<PathBuf> = None;
    let mut flags = flags.iter();
    while let Some(flag) = flags.next() {
        let value = flags
            .next()
            .ok_or_else(|| format!("`{flag}` needs a value"))?
            .clone();
        match flag.as_str() {
            "--title" => patch.title = Some(value),
            "--code" => patch.code = Some(value),
            "--code-file" => code_file = Some(PathBuf::from(value)),
            "--comment" => patch.comment = Some(value),
            "--language" => {
                patch.language = Some(value.parse::<Language>().map_err(|e| e.user_message())?)
            }
            other => return Err(format!("unknown flag `{other}`")),
        }
    }

    if let Some(path) = code_file {
        if patch.code.is_some() {
            return Err("use either --code or --code-file, not both".to_string());
        }
        let code = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        patch.code = Some(code);
    }
    if patch.is_empty() {
        return Err("`edit` needs at least one field to change".to_string());
    }

    Ok(Command::Edit {
        id: id.clone(),
        patch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        Command::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse(&["tree"]).unwrap(), Command::Tree);
        assert_eq!(parse(&["add"]).unwrap(), Command::Add(None));
        assert_eq!(
            parse(&["add", "p1"]).unwrap(),
            Command::Add(Some("p1".to_string()))
        );
        assert_eq!(parse(&["rm", "x"]).unwrap(), Command::Remove("x".to_string()));
        assert!(parse(&["rm"]).is_err());
        assert!(parse(&[]).is_err());
        assert!(parse(&["frobnicate"]).is_err());
        assert_eq!(parse(&["config"]).unwrap(), Command::Config);
        assert_eq!(parse(&["config", "init"]).unwrap(), Command::ConfigInit);
        assert!(parse(&["config", "wipe"]).is_err());
    }

    #[test]
    fn test_parse_edit_flags() {
        let cmd = parse(&["edit", "n1", "--title", "Hello", "--language", "bash"]).unwrap();
        assert_eq!(
            cmd,
            Command::Edit {
                id: "n1".to_string(),
                patch: NotePatch {
                    title: Some("Hello".to_string()),
                    language: Some(Language::Bash),
                    ..NotePatch::default()
                },
            }
        );
        assert!(cmd.is_mutation());
    }

    #[test]
    fn test_parse_edit_rejects_bad_input() {
        assert!(parse(&["edit", "n1"]).is_err());
        assert!(parse(&["edit", "n1", "--title"]).is_err());
        assert!(parse(&["edit", "n1", "--language", "cobol"]).is_err());
        assert!(parse(&["edit", "n1", "--colour", "red"]).is_err());
    }

    #[test]
    fn test_parse_edit_reads_code_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippet.sh");
        std::fs::write(&path, "echo hi\n").unwrap();

        let cmd = parse(&["edit", "n1", "--code-file", path.to_str().unwrap()]).unwrap();
        match cmd {
            Command::Edit { patch, .. } => assert_eq!(patch.code.as_deref(), Some("echo hi\n")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
