//! Canonical runtime types to engine type names.

use super::Dialect;
use crate::ast::SqlType;

/// Engine type name for a canonical type. `Nullable(T)` maps like `T`.
pub fn type_name(dialect: Dialect, ty: &SqlType) -> &'static str {
    match dialect {
        Dialect::Postgres => postgres(ty),
        Dialect::Sqlite => sqlite(ty),
        Dialect::SqlServer => sql_server(ty),
    }
}

fn postgres(ty: &SqlType) -> &'static str {
    match ty {
        SqlType::Bool => "BOOLEAN",
        SqlType::I8 | SqlType::I16 => "SMALLINT",
        SqlType::I32 => "INTEGER",
        SqlType::I64 => "BIGINT",
        SqlType::F32 => "REAL",
        SqlType::F64 => "DOUBLE PRECISION",
        SqlType::Decimal => "NUMERIC",
        SqlType::Text => "TEXT",
        SqlType::Uuid => "UUID",
        SqlType::Timestamp => "TIMESTAMP",
        SqlType::TimestampTz => "TIMESTAMPTZ",
        SqlType::Date => "DATE",
        SqlType::Time => "TIME",
        SqlType::Bytes => "BYTEA",
        SqlType::Nullable(inner) => postgres(inner),
    }
}

// SQLite has type affinity rather than strict types; everything not numeric
// is stored as TEXT.
fn sqlite(ty: &SqlType) -> &'static str {
    match ty {
        SqlType::Bool => "BOOL",
        SqlType::I8 | SqlType::I16 | SqlType::I32 => "INT",
        SqlType::I64 => "BIGINT",
        SqlType::F32 => "FLOAT",
        SqlType::F64 => "REAL",
        SqlType::Decimal => "NUMERIC",
        SqlType::Text
        | SqlType::Uuid
        | SqlType::Timestamp
        | SqlType::TimestampTz
        | SqlType::Date
        | SqlType::Time
        | SqlType::Bytes => "TEXT",
        SqlType::Nullable(inner) => sqlite(inner),
    }
}

fn sql_server(ty: &SqlType) -> &'static str {
    match ty {
        SqlType::Bool => "BIT",
        SqlType::I8 | SqlType::I16 => "SMALLINT",
        SqlType::I32 => "INT",
        SqlType::I64 => "BIGINT",
        SqlType::F32 => "REAL",
        SqlType::F64 => "FLOAT",
        SqlType::Decimal => "DECIMAL",
        SqlType::Text => "NVARCHAR(MAX)",
        SqlType::Uuid => "UNIQUEIDENTIFIER",
        SqlType::Timestamp => "DATETIME2",
        SqlType::TimestampTz => "DATETIMEOFFSET",
        SqlType::Date => "DATE",
        SqlType::Time => "TIME",
        SqlType::Bytes => "VARBINARY(MAX)",
        SqlType::Nullable(inner) => sql_server(inner),
    }
}
