use std::sync::Arc;

use crate::service::FieldService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FieldService>,
}

impl AppState {
    pub fn new(service: FieldService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
