//! Schema introspection for the ingestion store.

use super::Store;
use crate::error::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Information about a table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, upper-cased (`TEXT`, `TIMESTAMP`, ...)
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    /// 1-based position in the primary key, 0 if not part of it
    pub primary_key: i32,
}

impl ColumnInfo {
    pub fn is_primary_key(&self) -> bool {
        self.primary_key > 0
    }
}

/// Information about an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub table_name: String,
    pub unique: bool,
    /// "c" for CREATE INDEX, "u" for UNIQUE constraints, "pk" for primary keys
    pub origin: String,
    pub columns: Vec<String>,
}

/// Information about a foreign key relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub from_column: String,
    pub to_table: String,
    pub to_column: Option<String>,
    pub on_update: String,
    pub on_delete: String,
}

/// Information about a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Primary-key columns in key order.
    pub fn primary_key(&self) -> Vec<&str> {
        let mut pk: Vec<&ColumnInfo> = self.columns.iter().filter(|c| c.is_primary_key()).collect();
        pk.sort_by_key(|c| c.primary_key);
        pk.into_iter().map(|c| c.name.as_str()).collect()
    }
}

/// Complete store schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub tables: Vec<TableInfo>,
    pub sqlite_version: String,
}

impl DatabaseSchema {
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }
}

impl Store {
    /// Get schema information for every user table.
    ///
    /// SQLite internals and the migration ledger are left out.
    pub fn get_schema(&self, include_sql: bool) -> Result<DatabaseSchema> {
        let conn = self.conn();

        let sqlite_version: String =
            conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(
            "SELECT name, sql FROM sqlite_master
             WHERE type = 'table'
             AND name NOT LIKE 'sqlite_%'
             AND name NOT LIKE 'refinery_%'
             ORDER BY name",
        )?;

        let table_names: Vec<(String, Option<String>)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut tables = Vec::new();

        for (table_name, sql) in table_names {
            tables.push(TableInfo {
                columns: table_columns(conn, &table_name)?,
                indexes: table_indexes(conn, &table_name)?,
                foreign_keys: table_foreign_keys(conn, &table_name)?,
                sql: if include_sql { sql } else { None },
                name: table_name,
            });
        }

        Ok(DatabaseSchema {
            tables,
            sqlite_version,
        })
    }

    /// Get a list of table names only (lightweight).
    pub fn get_table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table'
             AND name NOT LIKE 'sqlite_%'
             AND name NOT LIKE 'refinery_%'
             ORDER BY name",
        )?;

        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(names)
    }
}

fn table_columns(conn: &Connection, table_name: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{}')", table_name))?;

    let columns: Vec<ColumnInfo> = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                data_type: row.get::<_, String>(2)?.to_uppercase(),
                nullable: row.get::<_, i32>(3)? == 0,
                default_value: row.get(4)?,
                primary_key: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(columns)
}

fn table_indexes(conn: &Connection, table_name: &str) -> Result<Vec<IndexInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA index_list('{}')", table_name))?;

    let index_list: Vec<(String, bool, String)> = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(1)?,
                row.get::<_, i32>(2)? == 1,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut indexes = Vec::new();

    for (index_name, unique, origin) in index_list {
        let mut stmt = conn.prepare(&format!("PRAGMA index_info('{}')", index_name))?;

        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(2))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        indexes.push(IndexInfo {
            name: index_name,
            table_name: table_name.to_string(),
            unique,
            origin,
            columns,
        });
    }

    Ok(indexes)
}

fn table_foreign_keys(conn: &Connection, table_name: &str) -> Result<Vec<ForeignKeyInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list('{}')", table_name))?;

    let foreign_keys: Vec<ForeignKeyInfo> = stmt
        .query_map([], |row| {
            Ok(ForeignKeyInfo {
                from_column: row.get(3)?,
                to_table: row.get(2)?,
                to_column: row.get(4)?,
                on_update: row.get(5)?,
                on_delete: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(foreign_keys)
}
