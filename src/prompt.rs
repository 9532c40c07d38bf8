//! Terminal prompts.
//!
//! Everything the old forms asked for, asked on the terminal with
//! `dialoguer`. With `--yes` nothing is asked: confirmations take their
//! default answer and missing values are an error.

use crate::error::{ErrorKind, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use exn::ResultExt;
use sipkit_library::{Conflict, Operator, Prompt, Unattended};
use std::path::{Path, PathBuf};

/// Paths dragged into a terminal arrive quoted; keep only what is inside.
pub fn clean_path(raw: &str) -> PathBuf {
    PathBuf::from(raw.trim().trim_matches(['"', '\'']).trim())
}

pub struct Asker {
    yes: bool,
    theme: ColorfulTheme,
}

impl Asker {
    pub fn new(yes: bool) -> Self {
        Self { yes, theme: ColorfulTheme::default() }
    }

    pub fn unattended(&self) -> bool {
        self.yes
    }

    /// Operator answering the questions raised inside a batch.
    pub fn operator(&self) -> Box<dyn Operator> {
        match self.yes {
            true => Box::new(Unattended),
            false => Box::new(Terminal { theme: ColorfulTheme::default() }),
        }
    }

    /// `given` when it is a directory, otherwise ask until one is entered.
    pub fn dir(&self, given: Option<PathBuf>, what: &'static str) -> Result<PathBuf> {
        self.path(given, what, Path::is_dir, ErrorKind::NotADirectory)
    }

    /// `given` when it is a regular file, otherwise ask until one is entered.
    pub fn file(&self, given: Option<PathBuf>, what: &'static str) -> Result<PathBuf> {
        self.path(given, what, Path::is_file, ErrorKind::NotAFile)
    }

    fn path(
        &self,
        given: Option<PathBuf>,
        what: &'static str,
        valid: fn(&Path) -> bool,
        invalid: fn(PathBuf) -> ErrorKind,
    ) -> Result<PathBuf> {
        match given {
            Some(path) if valid(&path) => return Ok(path),
            Some(path) if self.yes => exn::bail!(invalid(path)),
            Some(path) => tracing::warn!(path = %path.display(), "incorrect path for the {what}"),
            None if self.yes => exn::bail!(ErrorKind::MissingArgument(what)),
            None => {},
        }
        loop {
            let raw = Input::<String>::with_theme(&self.theme)
                .with_prompt(format!("Path to the {what}"))
                .interact_text()
                .or_raise(|| ErrorKind::Prompt)?;
            let path = clean_path(&raw);
            if valid(&path) {
                return Ok(path);
            }
            tracing::warn!(path = %path.display(), "incorrect path for the {what}, try again");
        }
    }

    /// Free text, defaulting to `default` (also the unattended answer).
    pub fn text(&self, given: Option<String>, what: &str, default: &str) -> Result<String> {
        if let Some(value) = given {
            return Ok(value);
        }
        if self.yes {
            return Ok(default.to_string());
        }
        Input::<String>::with_theme(&self.theme)
            .with_prompt(what)
            .default(default.to_string())
            .allow_empty(true)
            .interact_text()
            .or_raise(|| ErrorKind::Prompt)
    }

    /// Text that is never echoed, and has no unattended answer.
    pub fn secret(&self, given: Option<String>, what: &'static str) -> Result<String> {
        match given {
            Some(value) => Ok(value),
            None if self.yes => exn::bail!(ErrorKind::MissingArgument(what)),
            None => Password::with_theme(&self.theme).with_prompt(what).interact().or_raise(|| ErrorKind::Prompt),
        }
    }

    pub fn confirm(&self, question: &str, default: bool) -> bool {
        if self.yes {
            return default;
        }
        Confirm::with_theme(&self.theme).with_prompt(question).default(default).interact().unwrap_or(default)
    }

    /// Index into `items`; `default` when unattended.
    pub fn select(&self, question: &str, items: &[&str], default: usize) -> Result<usize> {
        if self.yes {
            return Ok(default);
        }
        Select::with_theme(&self.theme)
            .with_prompt(question)
            .items(items)
            .default(default)
            .interact()
            .or_raise(|| ErrorKind::Prompt)
    }
}

struct Terminal {
    theme: ColorfulTheme,
}

impl Operator for Terminal {
    fn confirm(&mut self, prompt: &Prompt) -> bool {
        let default = prompt.default_answer();
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt.message())
            .default(default)
            .interact()
            .unwrap_or(default)
    }

    fn conflict(&mut self, existing: &Path) -> Conflict {
        let choice = Select::with_theme(&self.theme)
            .with_prompt(format!("'{}' already exists", existing.display()))
            .items(&["Overwrite", "Skip", "Quit"])
            .default(1)
            .interact();
        match choice {
            Ok(0) => Conflict::Overwrite,
            Ok(2) => Conflict::Quit,
            _ => Conflict::Skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/data/batch", "/data/batch")]
    #[case("  '/data/my batch'  ", "/data/my batch")]
    #[case("\"/data/batch\"\n", "/data/batch")]
    fn strips_quotes_and_whitespace(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_path(raw), PathBuf::from(expected));
    }

    #[test]
    fn unattended_never_prompts() {
        let asker = Asker::new(true);
        assert!(asker.confirm("Continue?", true));
        assert_eq!(asker.text(None, "Operator", "jdoe").unwrap(), "jdoe");
        assert_eq!(asker.select("Environment", &["Demo", "Production"], 0).unwrap(), 0);
        let err = asker.dir(None, "items folder").unwrap_err();
        assert_eq!(*err, ErrorKind::MissingArgument("items folder"));
        let err = asker.secret(None, "secret key").unwrap_err();
        assert_eq!(*err, ErrorKind::MissingArgument("secret key"));
    }

    #[test]
    fn unattended_rejects_invalid_paths() {
        let temp_dir = tempfile::tempdir().unwrap();
        let asker = Asker::new(true);
        assert_eq!(asker.dir(Some(temp_dir.path().to_path_buf()), "batch").unwrap(), temp_dir.path());
        let missing = temp_dir.path().join("missing");
        let err = asker.dir(Some(missing.clone()), "batch").unwrap_err();
        assert_eq!(*err, ErrorKind::NotADirectory(missing));
        let err = asker.file(Some(temp_dir.path().to_path_buf()), "CSV").unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotAFile(_)));
    }
}
