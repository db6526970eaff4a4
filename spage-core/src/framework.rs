use sqlx::PgPool;

/// Runs persistence queries against the shared connection pool.
///
/// Each query is a plain struct with a `Processor<Query>` implementation
/// on this type, so handlers read as `processor.process(Query { .. })`.
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
