//! Table and column naming for the session tables.
//!
//! Names are held as [`Identifier`]s, which only admit plain SQL identifiers.
//! They are validated when the schema is built or deserialized and always
//! reach SQL text double-quoted, so keywords such as `ORDER` are usable names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Default name of the session table.
pub const DEFAULT_TABLE_NAME: &str = "USER_SESSION";

/// Default name of the session id column.
pub const DEFAULT_SESSION_ID_COLUMN: &str = "SESSION_ID";

/// Default name of the payload column.
pub const DEFAULT_PAYLOAD_COLUMN: &str = "SESSION_OBJECT";

/// Default name of the expiration column.
pub const DEFAULT_EXPIRATION_COLUMN: &str = "EXPIRATION_DATETIME";

const MAX_IDENTIFIER_LEN: usize = 128;

/// A validated SQL identifier.
///
/// A name is one or two `.`-separated segments, each matching
/// `[A-Za-z_][A-Za-z0-9_]*`. Two segments are only meaningful for table names
/// (`schema.table`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Validate `name` as an identifier.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if is_valid_identifier(&name) {
            Ok(Self(name))
        } else {
            Err(SessionError::InvalidIdentifier(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier as it is written into SQL, each segment double-quoted.
    pub fn quoted(&self) -> String {
        self.0
            .split('.')
            .map(|segment| format!("\"{segment}\""))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Whether the identifier is schema-qualified.
    pub fn is_qualified(&self) -> bool {
        self.0.contains('.')
    }

    // Defaults are compile-time constants known to be valid.
    fn from_static(name: &'static str) -> Self {
        debug_assert!(is_valid_identifier(name));
        Self(name.to_string())
    }
}

fn is_valid_identifier(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_IDENTIFIER_LEN {
        return false;
    }
    let segments: Vec<&str> = name.split('.').collect();
    segments.len() <= 2 && segments.iter().all(|s| is_valid_segment(s))
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl TryFrom<String> for Identifier {
    type Error = SessionError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = SessionError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Column names are single segments; a dotted name is only valid as a table.
fn require_column(ident: &Identifier) -> Result<()> {
    if ident.is_qualified() {
        return Err(SessionError::InvalidIdentifier(ident.to_string()));
    }
    Ok(())
}

/// Layout of the session payload table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSchema {
    pub table_name: Identifier,
    pub session_id_column: Identifier,
    pub payload_column: Identifier,
    pub expiration_column: Identifier,
}

impl Default for SessionSchema {
    fn default() -> Self {
        Self {
            table_name: Identifier::from_static(DEFAULT_TABLE_NAME),
            session_id_column: Identifier::from_static(DEFAULT_SESSION_ID_COLUMN),
            payload_column: Identifier::from_static(DEFAULT_PAYLOAD_COLUMN),
            expiration_column: Identifier::from_static(DEFAULT_EXPIRATION_COLUMN),
        }
    }
}

impl SessionSchema {
    /// Build a schema from raw names, validating each one.
    pub fn new(
        table_name: &str,
        session_id_column: &str,
        payload_column: &str,
        expiration_column: &str,
    ) -> Result<Self> {
        let schema = Self {
            table_name: Identifier::new(table_name)?,
            session_id_column: Identifier::new(session_id_column)?,
            payload_column: Identifier::new(payload_column)?,
            expiration_column: Identifier::new(expiration_column)?,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Check the column names are unqualified and distinct.
    pub fn validate(&self) -> Result<()> {
        require_column(&self.session_id_column)?;
        require_column(&self.payload_column)?;
        require_column(&self.expiration_column)?;
        let columns = [
            &self.session_id_column,
            &self.payload_column,
            &self.expiration_column,
        ];
        for (i, a) in columns.iter().enumerate() {
            if columns[i + 1..].iter().any(|b| a.as_str().eq_ignore_ascii_case(b.as_str())) {
                return Err(SessionError::InvalidConfig(format!(
                    "column {a} is mapped more than once in table {}",
                    self.table_name
                )));
            }
        }
        Ok(())
    }

    /// DDL that provisions the table if it does not exist yet.
    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({} TEXT NOT NULL PRIMARY KEY, {} BLOB, {} INTEGER NOT NULL)",
            self.table_name.quoted(),
            self.session_id_column.quoted(),
            self.payload_column.quoted(),
            self.expiration_column.quoted()
        )
    }

    pub(crate) fn table_info_sql(&self) -> String {
        match self.table_name.as_str().split_once('.') {
            Some((database, table)) => format!("PRAGMA \"{database}\".table_info(\"{table}\")"),
            None => format!("PRAGMA table_info({})", self.table_name.quoted()),
        }
    }

    pub(crate) fn add_payload_column_sql(&self) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} BLOB",
            self.table_name.quoted(),
            self.payload_column.quoted()
        )
    }
}

/// Layout of an expiration-only table.
///
/// May name the payload table itself (see [`ExpirationSchema::from`]) or a
/// separate table holding only the id and expiration columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirationSchema {
    pub table_name: Identifier,
    pub session_id_column: Identifier,
    pub expiration_column: Identifier,
}

impl Default for ExpirationSchema {
    fn default() -> Self {
        Self::from(&SessionSchema::default())
    }
}

impl From<&SessionSchema> for ExpirationSchema {
    fn from(schema: &SessionSchema) -> Self {
        Self {
            table_name: schema.table_name.clone(),
            session_id_column: schema.session_id_column.clone(),
            expiration_column: schema.expiration_column.clone(),
        }
    }
}

impl ExpirationSchema {
    /// Build a schema from raw names, validating each one.
    pub fn new(table_name: &str, session_id_column: &str, expiration_column: &str) -> Result<Self> {
        let schema = Self {
            table_name: Identifier::new(table_name)?,
            session_id_column: Identifier::new(session_id_column)?,
            expiration_column: Identifier::new(expiration_column)?,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Check the column names are unqualified and distinct.
    pub fn validate(&self) -> Result<()> {
        require_column(&self.session_id_column)?;
        require_column(&self.expiration_column)?;
        if self
            .session_id_column
            .as_str()
            .eq_ignore_ascii_case(self.expiration_column.as_str())
        {
            return Err(SessionError::InvalidConfig(format!(
                "column {} is mapped more than once in table {}",
                self.session_id_column, self.table_name
            )));
        }
        Ok(())
    }

    /// DDL that provisions a dedicated expiration table if it does not exist yet.
    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({} TEXT NOT NULL PRIMARY KEY, {} INTEGER NOT NULL)",
            self.table_name.quoted(),
            self.session_id_column.quoted(),
            self.expiration_column.quoted()
        )
    }
}
