use crate::db::{DbPool, OrmConn};

/// Both connection flavors ride along: the sqlx pool for row-shaped
/// queries, the SeaORM connection for entity and transaction work.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn) -> Self {
        Self { pool, orm }
    }
}
