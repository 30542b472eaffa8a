use anyhow::{Context, bail};
use std::path::{Path, PathBuf};

/// Fixed set of named destination directories a download can target.
///
/// The first entry is the default when no selector is given; unknown
/// selectors are rejected.
#[derive(Debug, Clone)]
pub struct Folders {
    entries: Vec<(String, PathBuf)>,
}

impl Folders {
    /// Parses repeated `NAME=PATH` arguments. With no arguments the
    /// defaults are `downloads=./downloads` and `private=./private`.
    pub fn from_args(args: &[String]) -> anyhow::Result<Self> {
        if args.is_empty() {
            return Ok(Self {
                entries: vec![
                    ("downloads".into(), PathBuf::from("./downloads")),
                    ("private".into(), PathBuf::from("./private")),
                ],
            });
        }

        let mut entries = Vec::with_capacity(args.len());
        for arg in args {
            let (name, path) = arg
                .split_once('=')
                .with_context(|| format!("invalid folder mapping '{}', expected NAME=PATH", arg))?;
            if name.is_empty() || path.is_empty() {
                bail!("invalid folder mapping '{}', expected NAME=PATH", arg);
            }
            entries.push((name.to_string(), PathBuf::from(path)));
        }
        Ok(Self { entries })
    }

    /// Resolves a folder selector to its directory. `None` selects the
    /// first configured entry; an unrecognized name resolves to nothing.
    pub fn resolve(&self, selector: Option<&str>) -> Option<&Path> {
        match selector {
            None => self.entries.first().map(|(_, path)| path.as_path()),
            Some(name) => self
                .entries
                .iter()
                .find(|(entry, _)| entry == name)
                .map(|(_, path)| path.as_path()),
        }
    }
}
