//! Inline literal rendering, including date/time formats per dialect.

use super::Dialect;
use super::writer::SqlWriter;
use crate::ast::Value;
use crate::error::{CoreError, CoreResult};
use chrono::SecondsFormat;

/// Quote a string literal, doubling embedded quotes.
pub(crate) fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Render a date/time value.
///
/// Engines with typed literals get `TIMESTAMP '...'`; the rest get a quoted
/// round-trip (ISO 8601) string that parses back to the same value.
fn datetime_literal(dialect: Dialect, keyword: &str, typed: String, round_trip: String) -> String {
    if dialect.has_typed_datetime_literals() {
        format!("{} {}", keyword, quote_string(&typed))
    } else {
        quote_string(&round_trip)
    }
}

impl SqlWriter {
    pub(crate) fn write_literal(&mut self, value: &Value) -> CoreResult<()> {
        let dialect = self.dialect();
        let sql = match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => dialect.bool_literal(*b).to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => {
                if !f.is_finite() {
                    return Err(CoreError::unsupported(
                        dialect,
                        format!("non-finite float literal {}", f),
                    ));
                }
                format!("{:?}", f)
            }
            Value::Decimal(d) => d.to_string(),
            Value::Text(s) => quote_string(s),
            Value::Uuid(u) => quote_string(&u.to_string()),
            Value::Bytes(b) => match dialect {
                Dialect::Postgres => format!("'\\x{}'::bytea", hex(b)),
                Dialect::Sqlite => format!("X'{}'", hex(b)),
                Dialect::SqlServer => format!("0x{}", hex(b)),
            },
            Value::Timestamp(ts) => datetime_literal(
                dialect,
                "TIMESTAMP",
                ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
                ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            ),
            Value::TimestampTz(ts) => datetime_literal(
                dialect,
                "TIMESTAMPTZ",
                ts.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string(),
                ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ),
            Value::Date(d) => {
                let text = d.format("%Y-%m-%d").to_string();
                datetime_literal(dialect, "DATE", text.clone(), text)
            }
            Value::Time(t) => {
                let text = t.format("%H:%M:%S%.f").to_string();
                datetime_literal(dialect, "TIME", text.clone(), text)
            }
        };
        self.push(&sql);
        Ok(())
    }
}
