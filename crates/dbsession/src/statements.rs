//! Parameterized SQL derived from a schema.
//!
//! Statements are rendered once when a store is built and never change
//! afterwards. Every statement binds the session id (and values) through
//! numbered parameters; only validated, quoted identifiers are spliced into
//! the text.

use crate::schema::{ExpirationSchema, SessionSchema};

/// Statements used by [`DbStore`](crate::DbStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatements {
    select: String,
    insert: String,
    update: String,
    delete: String,
}

impl SessionStatements {
    pub fn build(schema: &SessionSchema) -> Self {
        let table = schema.table_name.quoted();
        let id = schema.session_id_column.quoted();
        let payload = schema.payload_column.quoted();
        let expiration = schema.expiration_column.quoted();

        Self {
            // ?1 = session id
            select: format!("SELECT {payload}, {expiration} FROM {table} WHERE {id} = ?1"),
            // ?1 = session id, ?2 = payload, ?3 = expiration
            insert: format!(
                "INSERT INTO {table} ({id}, {payload}, {expiration}) VALUES (?1, ?2, ?3)"
            ),
            // ?1 = payload, ?2 = expiration, ?3 = session id
            update: format!("UPDATE {table} SET {payload} = ?1, {expiration} = ?2 WHERE {id} = ?3"),
            // ?1 = session id
            delete: format!("DELETE FROM {table} WHERE {id} = ?1"),
        }
    }

    pub fn select(&self) -> &str {
        &self.select
    }

    pub fn insert(&self) -> &str {
        &self.insert
    }

    pub fn update(&self) -> &str {
        &self.update
    }

    pub fn delete(&self) -> &str {
        &self.delete
    }
}

/// Statements used by [`ExpirationTracker`](crate::ExpirationTracker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirationStatements {
    select: String,
    count: String,
    insert: String,
    update: String,
    delete: String,
}

impl ExpirationStatements {
    pub fn build(schema: &ExpirationSchema) -> Self {
        let table = schema.table_name.quoted();
        let id = schema.session_id_column.quoted();
        let expiration = schema.expiration_column.quoted();

        Self {
            select: format!("SELECT {expiration} FROM {table} WHERE {id} = ?1"),
            count: format!("SELECT COUNT(*) FROM {table} WHERE {id} = ?1"),
            // ?1 = session id, ?2 = expiration
            insert: format!("INSERT INTO {table} ({id}, {expiration}) VALUES (?1, ?2)"),
            // ?1 = expiration, ?2 = session id
            update: format!("UPDATE {table} SET {expiration} = ?1 WHERE {id} = ?2"),
            delete: format!("DELETE FROM {table} WHERE {id} = ?1"),
        }
    }

    pub fn select(&self) -> &str {
        &self.select
    }

    pub fn count(&self) -> &str {
        &self.count
    }

    pub fn insert(&self) -> &str {
        &self.insert
    }

    pub fn update(&self) -> &str {
        &self.update
    }

    pub fn delete(&self) -> &str {
        &self.delete
    }
}
