//! Command-line option parsing.
//!
//! Hand-rolled rather than pulled in from a crate: the surface here is a
//! path and two flags, nowhere near the scale `doge` needed `getopts` for.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

pub(crate) const USAGE: &str = "\
Usage:
  cdns-dump [options] <file.cdns>

Options:
  -t, --text           dump the file as annotated text instead of a summary
  -o, --output <path>  write the text dump to <path> instead of stdout
  -h, --help           show this usage text
";

#[derive(Debug)]
pub(crate) struct Options {
    pub(crate) path: PathBuf,
    pub(crate) text_dump: bool,
    pub(crate) output: Option<PathBuf>,
}

pub(crate) enum OptionsResult {
    Ok(Options),
    Help,
    InvalidOptions(InvalidOptions),
}

#[derive(Debug)]
pub(crate) struct InvalidOptions(String);

impl fmt::Display for InvalidOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Options {
    pub(crate) fn parse(args: impl Iterator<Item = OsString>) -> OptionsResult {
        let mut path = None;
        let mut text_dump = false;
        let mut output = None;

        let mut args = args.peekable();
        while let Some(arg) = args.next() {
            let arg = match arg.into_string() {
                Ok(arg) => arg,
                Err(bad) => {
                    return OptionsResult::InvalidOptions(InvalidOptions(format!(
                        "argument is not valid UTF-8: {bad:?}"
                    )))
                }
            };

            match arg.as_str() {
                "-h" | "--help" => return OptionsResult::Help,
                "-t" | "--text" => text_dump = true,
                "-o" | "--output" => match args.next() {
                    Some(value) => output = Some(PathBuf::from(value)),
                    None => {
                        return OptionsResult::InvalidOptions(InvalidOptions(
                            "--output needs a path argument".into(),
                        ))
                    }
                },
                _ if path.is_none() => path = Some(PathBuf::from(arg)),
                other => {
                    return OptionsResult::InvalidOptions(InvalidOptions(format!(
                        "unexpected argument: {other}"
                    )))
                }
            }
        }

        match path {
            Some(path) => OptionsResult::Ok(Options { path, text_dump, output }),
            None => OptionsResult::InvalidOptions(InvalidOptions("no input file given".into())),
        }
    }
}
