//! SQL identifier handling
//!
//! Table and column names cannot be bound as parameters, so every name that
//! ends up in a statement goes through [`Identifier::parse`] first and is
//! rendered backtick-quoted.

mod builder;

use std::{collections::HashSet, fmt, sync::LazyLock};

pub use builder::InsertStatement;

static IDENTIFIER: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// MySQL limit for table and column names.
pub const MAX_IDENTIFIER_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("empty identifier")]
    Empty,
    #[error("identifier is {len} bytes long, limit is 64: {name}")]
    TooLong { name: String, len: usize },
    #[error("invalid identifier: {0:?}")]
    Invalid(String),
    #[error("column not allowed: {0}")]
    NotAllowed(String),
    #[error("duplicate column: {0}")]
    Duplicate(String),
}

/// A validated table or column name. `Display` renders it quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(name: &str) -> Result<Self, IdentifierError> {
        if name.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong {
                name: name.to_owned(),
                len: name.len(),
            });
        }
        if !IDENTIFIER.is_match(name) {
            return Err(IdentifierError::Invalid(name.to_owned()));
        }
        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.0)
    }
}

/// Decides which header names may be used as columns.
#[derive(Debug, Clone, Default)]
pub struct ColumnPolicy {
    // lowercased; `None` accepts any well-formed identifier
    allowed: Option<HashSet<String>>,
}

impl ColumnPolicy {
    pub fn any() -> Self {
        Self::default()
    }

    /// Blank entries are ignored. An allow-list with no usable entries
    /// behaves like [`ColumnPolicy::any`].
    pub fn allow_list<I, S>(columns: I) -> Result<Self, IdentifierError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed = HashSet::new();
        for column in columns {
            let column = column.as_ref().trim();
            if column.is_empty() {
                continue;
            }
            let column = Identifier::parse(column)?;
            allowed.insert(column.as_str().to_ascii_lowercase());
        }
        Ok(Self {
            allowed: (!allowed.is_empty()).then_some(allowed),
        })
    }

    pub fn is_restricted(&self) -> bool {
        self.allowed.is_some()
    }

    /// Validates a parsed header, keeping its order.
    pub fn columns(&self, header: &[String]) -> Result<Vec<Identifier>, IdentifierError> {
        let mut seen = HashSet::with_capacity(header.len());
        header
            .iter()
            .map(|name| {
                let column = Identifier::parse(name)?;
                let folded = column.as_str().to_ascii_lowercase();
                if let Some(allowed) = &self.allowed {
                    if !allowed.contains(&folded) {
                        return Err(IdentifierError::NotAllowed(name.clone()));
                    }
                }
                if !seen.insert(folded) {
                    return Err(IdentifierError::Duplicate(name.clone()));
                }
                Ok(column)
            })
            .collect()
    }
}
