//! Per-dialect rendering of whole statements.

use crate::ast::*;
use crate::error::CoreError;
use crate::resolver::{Dialect, ToSql};
use pretty_assertions::assert_eq;

fn sql(stmt: &impl ToSql, dialect: Dialect) -> String {
    stmt.to_sql(dialect).unwrap()
}

#[test]
fn test_select_with_params() {
    let q = Select::from_table("users")
        .columns(["id", "name"])
        .filter(col("active").eq(true))
        .filter(col("id").eq(param(7)));

    let pg = q.resolve(Dialect::Postgres).unwrap();
    assert_eq!(pg.sql, "SELECT id, name FROM users WHERE active = true AND id = $1");
    assert_eq!(pg.params, vec![Value::Int(7)]);

    assert_eq!(
        sql(&q, Dialect::Sqlite),
        "SELECT id, name FROM users WHERE active = 1 AND id = ?"
    );
    assert_eq!(
        sql(&q, Dialect::SqlServer),
        "SELECT id, name FROM users WHERE active = 1 AND id = @p1"
    );
}

#[test]
fn test_reserved_identifiers() {
    let q = Select::from_table("order").columns(["user"]);
    assert_eq!(sql(&q, Dialect::Postgres), "SELECT \"user\" FROM \"order\"");
    assert_eq!(sql(&q, Dialect::Sqlite), "SELECT \"user\" FROM \"order\"");
    assert_eq!(sql(&q, Dialect::SqlServer), "SELECT [user] FROM [order]");
}

#[test]
fn test_select_without_from() {
    let q = Select::new().column(lit(1));
    for dialect in [Dialect::Postgres, Dialect::Sqlite, Dialect::SqlServer] {
        assert_eq!(sql(&q, dialect), "SELECT 1");
    }
}

#[test]
fn test_paging() {
    let q = Select::from_table("t")
        .order_by(col("id"), SortOrder::Asc)
        .limit(10)
        .offset(20);
    assert_eq!(
        sql(&q, Dialect::Postgres),
        "SELECT * FROM t ORDER BY id LIMIT 10 OFFSET 20"
    );
    assert_eq!(
        sql(&q, Dialect::Sqlite),
        "SELECT * FROM t ORDER BY id LIMIT 10 OFFSET 20"
    );
    assert_eq!(
        sql(&q, Dialect::SqlServer),
        "SELECT * FROM t ORDER BY id OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
    );

    let q = Select::from_table("t").limit(5);
    assert_eq!(sql(&q, Dialect::SqlServer), "SELECT TOP (5) * FROM t");

    let q = Select::from_table("t").offset(5);
    assert_eq!(sql(&q, Dialect::Sqlite), "SELECT * FROM t LIMIT -1 OFFSET 5");
    assert_eq!(
        sql(&q, Dialect::SqlServer),
        "SELECT * FROM t ORDER BY (SELECT NULL) OFFSET 5 ROWS"
    );
}

#[test]
fn test_order_desc_and_group_by() {
    let q = Select::from_table("orders")
        .column(col("user_id"))
        .column_as(func(Func::Count, []), "n")
        .group_by(col("user_id"))
        .having(func(Func::Count, []).gt(2))
        .order_by(col("n"), SortOrder::Desc);
    assert_eq!(
        sql(&q, Dialect::Postgres),
        "SELECT user_id, COUNT(*) AS n FROM orders GROUP BY user_id HAVING COUNT(*) > 2 ORDER BY n DESC"
    );
}

#[test]
fn test_union() {
    let q = Select::new().column(lit(1)).union(Select::new().column(lit(2)));
    for dialect in [Dialect::Postgres, Dialect::Sqlite, Dialect::SqlServer] {
        assert_eq!(sql(&q, dialect), "SELECT 1 UNION SELECT 2");
    }
}

#[test]
fn test_set_operand_with_paging_is_isolated() {
    let q = Select::from_table("a").union(Select::from_table("b").limit(1));
    assert_eq!(
        sql(&q, Dialect::Postgres),
        "SELECT * FROM a UNION (SELECT * FROM b LIMIT 1)"
    );
    assert_eq!(
        sql(&q, Dialect::Sqlite),
        "SELECT * FROM a UNION SELECT * FROM (SELECT * FROM b LIMIT 1) AS _setop"
    );
    assert_eq!(
        sql(&q, Dialect::SqlServer),
        "SELECT * FROM a UNION SELECT * FROM (SELECT TOP (1) * FROM b) AS _setop"
    );
}

#[test]
fn test_nested_ordering_on_sql_server_is_paged() {
    let ordered = Select::from_table("t").order_by(col("id"), SortOrder::Asc);
    let q = Select::new()
        .column(func(Func::Count, []))
        .from(FromEntry::subquery(ordered.clone()).alias("c"));
    assert_eq!(
        sql(&q, Dialect::SqlServer),
        "SELECT COUNT(*) FROM (SELECT * FROM t ORDER BY id OFFSET 0 ROWS) AS c"
    );
    assert_eq!(
        sql(&q, Dialect::Postgres),
        "SELECT COUNT(*) FROM (SELECT * FROM t ORDER BY id) AS c"
    );
    assert_eq!(sql(&ordered, Dialect::SqlServer), "SELECT * FROM t ORDER BY id");
}

#[test]
fn test_nested_with_rejected_on_sql_server() {
    let inner = Select::from_table("w").with(WithEntry::new("w", Select::from_table("t")));
    let q = Select::from_table("u").filter(Expr::Exists {
        query: Box::new(inner),
        negated: false,
    });
    assert_eq!(
        q.to_sql(Dialect::SqlServer).unwrap_err(),
        CoreError::unsupported(Dialect::SqlServer, "WITH in a nested query")
    );
    assert_eq!(
        sql(&q, Dialect::Sqlite),
        "SELECT * FROM u WHERE EXISTS (WITH w AS (SELECT * FROM t) SELECT * FROM w)"
    );
}

#[test]
fn test_joins() {
    let q = Select::new()
        .from(FromEntry::table("users").alias("u"))
        .from(
            FromEntry::table("orders")
                .alias("o")
                .join(JoinKind::Left, Some(qcol("o", "user_id").eq(qcol("u", "id")))),
        )
        .from(FromEntry::table("regions").join(JoinKind::Cross, None));
    assert_eq!(
        sql(&q, Dialect::Postgres),
        "SELECT * FROM users AS u LEFT JOIN orders AS o ON o.user_id = u.id CROSS JOIN regions"
    );

    let bad = Select::from_table("a").from(FromEntry::table("b").join(JoinKind::Inner, None));
    let err = bad.to_sql(Dialect::Postgres).unwrap_err();
    assert_eq!(err, CoreError::invalid("INNER JOIN without ON condition"));
}

#[test]
fn test_sql_server_trim_in_projection() {
    let q = Select::from_table("t").column_as(func(Func::Trim, [col("name")]), "n");
    assert_eq!(
        sql(&q, Dialect::SqlServer),
        "SELECT LTRIM(RTRIM(name)) AS n FROM t"
    );
    assert_eq!(sql(&q, Dialect::Sqlite), "SELECT TRIM(name) AS n FROM t");
}

#[test]
fn test_recursive_with() {
    let q = Select::from_table("r").with(
        WithEntry::new("r", Select::new().column(lit(1)))
            .columns(["n"])
            .recursive(),
    );
    assert_eq!(
        sql(&q, Dialect::Postgres),
        "WITH RECURSIVE r(n) AS (SELECT 1) SELECT * FROM r"
    );
    assert_eq!(
        sql(&q, Dialect::SqlServer),
        "WITH r(n) AS (SELECT 1) SELECT * FROM r"
    );
}

#[test]
fn test_update_alias_per_dialect() {
    let u = Update::table("users")
        .alias("u")
        .set("name", param("x"))
        .filter(qcol("u", "id").eq(param(1)));
    assert_eq!(
        sql(&u, Dialect::Postgres),
        "UPDATE users AS u SET name = $1 WHERE u.id = $2"
    );
    assert_eq!(
        sql(&u, Dialect::Sqlite),
        "UPDATE users SET name = ? WHERE users.id = ?"
    );
    assert_eq!(
        sql(&u, Dialect::SqlServer),
        "UPDATE u SET name = @p1 FROM users AS u WHERE u.id = @p2"
    );
}

#[test]
fn test_delete_with_sources() {
    let d = Delete::from_table("orders")
        .alias("o")
        .using(FromEntry::table("users").alias("u"))
        .filter(
            qcol("o", "user_id")
                .eq(qcol("u", "id"))
                .and(qcol("u", "banned").eq(true)),
        );
    assert_eq!(
        sql(&d, Dialect::Postgres),
        "DELETE FROM orders AS o USING users AS u WHERE o.user_id = u.id AND u.banned = true"
    );
    assert_eq!(
        sql(&d, Dialect::Sqlite),
        "DELETE FROM orders WHERE EXISTS (SELECT 1 FROM users AS u WHERE orders.user_id = u.id AND u.banned = 1)"
    );
    assert_eq!(
        sql(&d, Dialect::SqlServer),
        "DELETE o FROM orders AS o, users AS u WHERE o.user_id = u.id AND u.banned = 1"
    );
}

#[test]
fn test_plain_delete() {
    let d = Delete::from_table("sessions").filter(col("expired").eq(true));
    assert_eq!(
        sql(&d, Dialect::SqlServer),
        "DELETE FROM sessions WHERE expired = 1"
    );
}

#[test]
fn test_insert_forms() {
    let ins = Insert::into("users")
        .alias("n")
        .columns(["id", "name"])
        .values([param(1), param("a")])
        .values([param(2), param("b")]);
    assert_eq!(
        sql(&ins, Dialect::Postgres),
        "INSERT INTO users AS n (id, name) VALUES ($1, $2), ($3, $4)"
    );
    assert_eq!(
        sql(&ins, Dialect::Sqlite),
        "INSERT INTO users (id, name) VALUES (?, ?), (?, ?)"
    );
    let resolved = ins.resolve(Dialect::SqlServer).unwrap();
    assert_eq!(
        resolved.sql,
        "INSERT INTO users (id, name) VALUES (@p1, @p2), (@p3, @p4)"
    );
    assert_eq!(resolved.params.len(), 4);

    let ins = Insert::into("t").default_values();
    assert_eq!(sql(&ins, Dialect::Postgres), "INSERT INTO t DEFAULT VALUES");

    let ins = Insert::into("archive")
        .columns(["id"])
        .select(Select::from_table("t").columns(["id"]));
    assert_eq!(
        sql(&ins, Dialect::Sqlite),
        "INSERT INTO archive (id) SELECT id FROM t"
    );
}

#[test]
fn test_statement_dispatch() {
    let stmt: Statement = Select::from_table("t").into();
    assert_eq!(
        crate::resolver::resolve(Dialect::Sqlite, &stmt).unwrap().sql,
        "SELECT * FROM t"
    );

    let stmt: Statement = Update::table("t").into();
    let err = crate::resolver::resolve(Dialect::Sqlite, &stmt).unwrap_err();
    assert_eq!(err, CoreError::invalid("UPDATE without assignments"));
}
