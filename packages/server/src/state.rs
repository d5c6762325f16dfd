use std::sync::Arc;

use common::push::PushSender;
use common::storage::FileStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub files: Arc<dyn FileStore>,
    /// `None` when push delivery is disabled.
    pub push: Option<Arc<dyn PushSender>>,
}
