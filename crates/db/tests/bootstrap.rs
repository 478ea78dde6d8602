use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "./migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    // Health check
    atelie_db::health_check(&pool).await.unwrap();

    // Every table the repositories touch must exist.
    let tables = [
        "users",
        "sessions",
        "clients",
        "projects",
        "budgets",
        "contracts",
        "payments",
        "schedules",
        "evaluations",
        "events",
        "notifications",
        "audit_logs",
    ];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert!(count.0 >= 0, "{table} should be queryable");
    }
}

/// The conflict-classified constraints must carry the `uq_` prefix the API
/// error classifier keys on.
#[sqlx::test(migrations = "./migrations")]
async fn test_conflict_constraints_use_uq_prefix(pool: PgPool) {
    let names: Vec<(String,)> = sqlx::query_as(
        "SELECT conname::TEXT FROM pg_constraint WHERE contype = 'u' ORDER BY conname",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    let names: Vec<String> = names.into_iter().map(|(n,)| n).collect();
    for expected in [
        "uq_budgets_approval_token",
        "uq_clients_document",
        "uq_contracts_budget",
        "uq_evaluations_triple",
        "uq_payments_budget_type",
        "uq_payments_gateway_event",
        "uq_schedules_project",
        "uq_sessions_token_hash",
        "uq_users_email",
    ] {
        assert!(
            names.iter().any(|n| n == expected),
            "missing unique constraint {expected}, have: {names:?}"
        );
    }
}
