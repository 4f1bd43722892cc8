/*
 * Responsibility
 * - shared context attached to the Router (AppState)
 * - Clone is cheap (Arc inside); no mutable state lives here
 */
use std::sync::Arc;

use crate::services::directory::DirectoryClient;

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn DirectoryClient>,
}

impl AppState {
    pub fn new(directory: Arc<dyn DirectoryClient>) -> Self {
        Self { directory }
    }
}
