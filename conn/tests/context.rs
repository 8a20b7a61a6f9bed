mod common;

use common::{FAKE_PID, FakeDriver};
use pretty_assertions::assert_eq;
use sqlweave_conn::{ConnError, ConnectionArguments, ContextState, DriverError, Provider};
use sqlweave_core::ast::{Select, col, param};
use sqlweave_core::resolver::Dialect;
use std::sync::atomic::Ordering;

fn provider(dialect: Dialect) -> (Provider<FakeDriver>, std::sync::Arc<common::FakeState>) {
    common::init_tracing();
    let (driver, state) = FakeDriver::new(dialect);
    let args = ConnectionArguments::new("db", "app").pool_size(1, 50);
    (Provider::new(driver, args), state)
}

#[tokio::test]
async fn test_open_uses_normalized_connection_string() {
    let (provider, state) = provider(Dialect::Postgres);
    let ctx = provider.create_context();
    assert_eq!(ctx.state().await, ContextState::Created);
    assert_eq!(state.connects(), 0);

    ctx.open().await.unwrap();
    ctx.open().await.unwrap();
    assert_eq!(ctx.state().await, ContextState::Open);
    assert_eq!(state.connects(), 1);
    assert_eq!(
        state.connection_strings.lock().unwrap()[0],
        "Host=db;Database=app;Pooling=false;Max Auto Prepare=0;Enlist=false"
    );
}

#[tokio::test]
async fn test_process_id_fetched_lazily_once() {
    let (provider, state) = provider(Dialect::Postgres);
    let ctx = provider.open_context().await.unwrap();
    assert_eq!(state.count_statements("SELECT pg_backend_pid()"), 0);

    assert_eq!(ctx.process_id().await, Some(FAKE_PID));
    assert_eq!(ctx.process_id().await, Some(FAKE_PID));
    assert_eq!(state.count_statements("SELECT pg_backend_pid()"), 1);

    ctx.close().await;
    assert_eq!(ctx.process_id().await, None);
}

#[tokio::test]
async fn test_process_id_from_handshake() {
    let (provider, state) = provider(Dialect::SqlServer);
    state.eager_pid.store(true, Ordering::SeqCst);
    let ctx = provider.open_context().await.unwrap();
    assert_eq!(ctx.process_id().await, Some(FAKE_PID));
    assert_eq!(state.count_statements("SELECT @@SPID"), 0);
}

#[tokio::test]
async fn test_sqlite_has_no_process_id() {
    let (provider, state) = provider(Dialect::Sqlite);
    let ctx = provider.open_context().await.unwrap();
    assert_eq!(ctx.process_id().await, None);
    assert!(state.statements().is_empty());
}

#[tokio::test]
async fn test_close_is_idempotent_and_final() {
    let (provider, state) = provider(Dialect::Postgres);
    let ctx = provider.open_context().await.unwrap();
    assert_eq!(state.open_connections(), 1);

    ctx.close().await;
    ctx.close().await;
    assert_eq!(ctx.state().await, ContextState::Closed);
    assert_eq!(state.open_connections(), 0);
    assert_eq!(state.count_statements("DISCONNECT"), 1);

    let err = ctx.query("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, ConnError::InvalidState(ContextState::Closed)));
    let err = ctx.open().await.unwrap_err();
    assert!(matches!(err, ConnError::InvalidState(ContextState::Closed)));
}

#[tokio::test]
async fn test_statement_error_keeps_connection() {
    let (provider, state) = provider(Dialect::Postgres);
    let ctx = provider.open_context().await.unwrap();
    state.fail_once(
        "SELECT * FROM missing",
        DriverError::statement("42P01", "relation \"missing\" does not exist"),
    );

    let err = ctx
        .query_statement(&Select::from_table("missing").into())
        .await
        .unwrap_err();
    assert!(matches!(err, ConnError::TransientExecution(_)));
    assert_eq!(ctx.state().await, ContextState::Open);
    ctx.keepalive().await.unwrap();
}

#[tokio::test]
async fn test_broken_connection_is_dropped() {
    let (provider, state) = provider(Dialect::Postgres);
    let ctx = provider.open_context().await.unwrap();
    assert_eq!(ctx.process_id().await, Some(FAKE_PID));

    state.kill_connections();
    let err = ctx.keepalive().await.unwrap_err();
    assert!(err.is_connection_broken());
    assert_eq!(ctx.state().await, ContextState::Broken);
    assert_eq!(state.open_connections(), 0);
    assert_eq!(ctx.process_id().await, None);

    let err = ctx.keepalive().await.unwrap_err();
    assert!(matches!(err, ConnError::InvalidState(ContextState::Broken)));
}

#[tokio::test]
async fn test_refused_connect_is_broken() {
    let (provider, state) = provider(Dialect::Postgres);
    state.refuse_connects(1);
    let ctx = provider.create_context();

    let err = ctx.open().await.unwrap_err();
    assert!(err.is_connection_broken());
    assert_eq!(ctx.state().await, ContextState::Created);
    ctx.open().await.unwrap();
}

#[tokio::test]
async fn test_statements_resolve_for_the_connection_dialect() {
    let (provider, state) = provider(Dialect::SqlServer);
    let ctx = provider.open_context().await.unwrap();
    let query = Select::from_table("users")
        .columns(["id"])
        .filter(col("id").eq(param(7)));
    ctx.query_statement(&query.into()).await.unwrap();
    assert!(
        state
            .statements()
            .contains(&"SELECT id FROM users WHERE id = @p1".to_string())
    );
}
