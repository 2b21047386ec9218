use std::sync::Arc;

use equifolio_core::db::{self, DbPool};

pub fn setup_pool(dir: &tempfile::TempDir) -> Arc<DbPool> {
    let data_dir = dir.path().to_str().expect("utf-8 temp path");

    let db_path = db::init(data_dir).expect("Failed to initialize database");
    let pool = db::create_pool(&db_path).expect("Failed to create database pool");
    db::run_migrations(&pool).expect("Failed to run migrations");

    pool
}
