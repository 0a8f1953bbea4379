use std::path::Path;
use std::sync::Arc;

use super::{config::Config, db::Database};

pub struct AppState {
    pub db: Database,
    pub config: Config,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        let config = Config::load();

        let db = Database::open(Path::new(&config.db_path)).expect("Failed to open database");
        db.initialize().expect("Failed to initialize database");

        Arc::new(Self { db, config })
    }
}
