//! Statement builder that keeps SQL text and bind values in step.
//!
//! Every `?` written by the builder is pushed together with its value, so the
//! parameter list always lines up with the placeholders in the text. A statement
//! may carry one membership list (`IN (...)`), whose placeholders and values are
//! only filled in when the statement is rendered for a concrete chunk of ids.

use rusqlite::ToSql;
use rusqlite::types::Value;

use crate::error::{Result, WalletDbError};

/// A predicate fragment plus the values its placeholders bind, in order.
#[derive(Clone, Debug, PartialEq)]
pub struct Clause {
    sql: String,
    params: Vec<Value>,
}

impl Clause {
    pub fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }
    pub fn sql(&self) -> &str {
        &self.sql
    }
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

// Where the membership list goes: a byte offset into the text and the index
// in the parameter list at which the ids are spliced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct IdList {
    offset: usize,
    param_index: usize,
}

#[derive(Clone, Debug, Default)]
pub struct SqlBuilder {
    sql: String,
    params: Vec<Value>,
    id_list: Option<IdList>,
}

impl SqlBuilder {
    pub fn new(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            params: Vec::new(),
            id_list: None,
        }
    }

    pub fn push_sql(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Appends a single placeholder bound to `value`.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.sql.push('?');
        self.params.push(value.into());
        self
    }

    pub fn push_clause(&mut self, clause: &Clause) -> &mut Self {
        self.sql.push_str(&clause.sql);
        self.params.extend(clause.params.iter().cloned());
        self
    }

    /// Marks the spot where the comma separated id placeholders are rendered.
    /// The surrounding parentheses are written by the caller.
    pub fn push_id_list(&mut self) -> Result<&mut Self> {
        if self.id_list.is_some() {
            return Err(WalletDbError::Precondition(
                "a statement can only hold one id list".to_string(),
            ));
        }
        self.id_list = Some(IdList {
            offset: self.sql.len(),
            param_index: self.params.len(),
        });
        Ok(self)
    }

    pub fn has_id_list(&self) -> bool {
        self.id_list.is_some()
    }

    /// Number of values bound outside of the id list.
    pub fn fixed_param_count(&self) -> usize {
        self.params.len()
    }

    /// The statement text, only valid for statements without an id list.
    pub fn sql(&self) -> Result<&str> {
        match self.id_list {
            None => Ok(&self.sql),
            Some(_) => Err(WalletDbError::Precondition(
                "statement with an id list must be rendered with ids".to_string(),
            )),
        }
    }

    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|value| value as &dyn ToSql).collect()
    }

    /// Renders the statement for one chunk of ids, returning the text and the
    /// full ordered parameter list.
    pub fn render<'a, I: ToSql>(&'a self, ids: &'a [I]) -> Result<(String, Vec<&'a dyn ToSql>)> {
        let id_list = self.id_list.ok_or_else(|| {
            WalletDbError::Precondition("statement has no id list to render".to_string())
        })?;
        if ids.is_empty() {
            return Err(WalletDbError::Precondition(
                "an id list cannot be rendered empty".to_string(),
            ));
        }
        let placeholders = std::iter::repeat("?")
            .take(ids.len())
            .collect::<Vec<_>>()
            .join(",");
        let mut sql = String::with_capacity(self.sql.len() + placeholders.len());
        sql.push_str(&self.sql[..id_list.offset]);
        sql.push_str(&placeholders);
        sql.push_str(&self.sql[id_list.offset..]);

        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(self.params.len() + ids.len());
        params.extend(self.params[..id_list.param_index].iter().map(|v| v as &dyn ToSql));
        params.extend(ids.iter().map(|id| id as &dyn ToSql));
        params.extend(self.params[id_list.param_index..].iter().map(|v| v as &dyn ToSql));
        Ok((sql, params))
    }
}
