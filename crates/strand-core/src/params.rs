//! Key/value parameter source.
//!
//! Parameter files are plain text, one `key=value` per line. All
//! whitespace is removed from a line before it is parsed, `#` starts a
//! comment line, and a repeated key overrides the earlier value.

use crate::error::ParamsError;
use indexmap::IndexMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// An insertion-ordered map of string parameters.
///
/// # Examples
///
/// ```
/// use strand_core::Params;
///
/// let params = Params::from_text("# run\nnsteps = 100\noutput_frequency=10\n").unwrap();
/// assert_eq!(params.get("nsteps"), Some("100"));
/// assert_eq!(params.parse::<u64>("output_frequency").unwrap(), 10);
/// assert_eq!(params.parse_or::<usize>("ghost_width", 1).unwrap(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    entries: IndexMap<String, String>,
}

impl Params {
    /// An empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse parameter text.
    pub fn from_text(text: &str) -> Result<Self, ParamsError> {
        let mut params = Self::new();
        for (i, raw) in text.lines().enumerate() {
            let line: String = raw
                .chars()
                .filter(|c| !matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b'))
                .collect();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ParamsError::MissingSeparator {
                    line: i + 1,
                    content: line,
                });
            };
            if key.is_empty() {
                return Err(ParamsError::EmptyKey { line: i + 1 });
            }
            params.set(key, value);
        }
        Ok(params)
    }

    /// Read and parse a parameter file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let text = fs::read_to_string(path)?;
        Self::from_text(&text)
    }

    /// Insert or replace a parameter.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Raw value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Raw value of a required `key`.
    pub fn require(&self, key: &str) -> Result<&str, ParamsError> {
        self.get(key).ok_or_else(|| ParamsError::Missing {
            key: key.to_string(),
        })
    }

    /// Parse a required `key` into `T`.
    pub fn parse<T>(&self, key: &str) -> Result<T, ParamsError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.require(key)?;
        parse_value(key, raw)
    }

    /// Parse `key` into `T`, or return `default` when absent.
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ParamsError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => parse_value(key, raw),
            None => Ok(default),
        }
    }

    /// Parse a comma-separated list under `key`; empty when absent.
    pub fn parse_list<T>(&self, key: &str) -> Result<Vec<T>, ParamsError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None | Some("") => Ok(Vec::new()),
            Some(raw) => raw.split(',').map(|item| parse_value(key, item)).collect(),
        }
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ParamsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ParamsError::Invalid {
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn strips_whitespace_and_comments() {
        let text = "# comment\n\n  init_file = init.chk \r\n\tnsteps\t=\t10\n";
        let p = Params::from_text(text).unwrap();
        assert_eq!(p.get("init_file"), Some("init.chk"));
        assert_eq!(p.get("nsteps"), Some("10"));
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn later_key_overrides_and_keeps_position() {
        let p = Params::from_text("a=1\nb=2\na=3\n").unwrap();
        assert_eq!(p.get("a"), Some("3"));
        let keys: Vec<_> = p.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn splits_at_first_equals() {
        let p = Params::from_text("expr=a=b\n").unwrap();
        assert_eq!(p.get("expr"), Some("a=b"));
    }

    #[test]
    fn missing_separator_is_an_error() {
        match Params::from_text("ok=1\nbroken line\n") {
            Err(ParamsError::MissingSeparator { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "brokenline");
            }
            other => panic!("expected MissingSeparator, got {other:?}"),
        }
    }

    #[test]
    fn empty_key_is_an_error() {
        assert!(matches!(
            Params::from_text("=5"),
            Err(ParamsError::EmptyKey { line: 1 })
        ));
    }

    #[test]
    fn typed_access() {
        let p: Params = [("n", "12"), ("grid", "2,0,1"), ("bad", "x")]
            .into_iter()
            .collect();
        assert_eq!(p.parse::<u64>("n").unwrap(), 12);
        assert_eq!(p.parse_list::<usize>("grid").unwrap(), vec![2, 0, 1]);
        assert!(p.parse_list::<usize>("absent").unwrap().is_empty());
        assert!(matches!(
            p.parse::<u64>("bad"),
            Err(ParamsError::Invalid { .. })
        ));
        assert!(matches!(
            p.parse::<u64>("absent"),
            Err(ParamsError::Missing { .. })
        ));
    }

    #[test]
    fn text_values_parse_into_types() {
        let p = Params::from_text("nsteps = 40\nprocess_grid = 2,0\n").unwrap();
        assert_eq!(p.parse::<u64>("nsteps").unwrap(), 40);
        assert_eq!(p.parse_list::<usize>("process_grid").unwrap(), vec![2, 0]);
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "nsteps=5").unwrap();
        let p = Params::from_file(file.path()).unwrap();
        assert_eq!(p.parse::<u32>("nsteps").unwrap(), 5);
    }
}
