//! Bounded field names and the name-to-position index.

use crate::error::NameError;
use indexmap::IndexSet;
use std::borrow::Borrow;
use std::fmt;

/// Maximum length of a field name, in bytes.
pub const MAX_FIELD_NAME_LEN: usize = 100;

/// A validated field name.
///
/// Non-empty, at most [`MAX_FIELD_NAME_LEN`] bytes, and free of `/`
/// and NUL so that it can be used as a single checkpoint path
/// component.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldName(String);

impl FieldName {
    /// Validate and wrap a field name.
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if name.len() > MAX_FIELD_NAME_LEN {
            return Err(NameError::TooLong { len: name.len() });
        }
        if let Some(ch) = name.chars().find(|&c| c == '/' || c == '\0') {
            return Err(NameError::InvalidCharacter { name, ch });
        }
        Ok(Self(name))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FieldName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Bijection between field names and their position in per-process
/// field storage.
///
/// Built once after the field table is known on every process and
/// immutable afterwards. Position `i` is the `i`-th buffer of every
/// [`FieldStack`](crate::FieldStack) in the run.
///
/// # Examples
///
/// ```
/// use strand_core::{FieldName, NameIndex};
///
/// let names = vec![FieldName::new("phi").unwrap(), FieldName::new("c").unwrap()];
/// let index = NameIndex::new(names).unwrap();
/// assert_eq!(index.position("c"), Some(1));
/// assert_eq!(index.name(0).unwrap().as_str(), "phi");
/// assert_eq!(index.position("eta"), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameIndex {
    names: IndexSet<FieldName>,
}

impl NameIndex {
    /// Build an index from names in storage order.
    ///
    /// Fails on duplicates.
    pub fn new(names: impl IntoIterator<Item = FieldName>) -> Result<Self, NameError> {
        let mut set = IndexSet::new();
        for name in names {
            if set.contains(&name) {
                return Err(NameError::Duplicate {
                    name: name.as_str().to_string(),
                });
            }
            set.insert(name);
        }
        Ok(Self { names: set })
    }

    /// Validate raw strings and build an index from them.
    pub fn from_strings<S: AsRef<str>>(names: &[S]) -> Result<Self, NameError> {
        let names = names
            .iter()
            .map(|s| FieldName::new(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(names)
    }

    /// Storage position of `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.get_index_of(name)
    }

    /// Name stored at `position`.
    pub fn name(&self, position: usize) -> Option<&FieldName> {
        self.names.get_index(position)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the index holds no fields.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate `(position, name)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FieldName)> {
        self.names.iter().enumerate()
    }
}
