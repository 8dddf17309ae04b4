//! Application state shared across handlers

use crate::auth::JwtDecoder;
use playlist_export_core::application::ExportService;
use playlist_export_core::port::MessageBroker;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub export_service: Arc<ExportService>,
    /// Admin endpoints read queue state straight from the broker
    pub broker: Arc<dyn MessageBroker>,
    pub queue: String,
    pub jwt_decoder: Arc<JwtDecoder>,
    /// `None` leaves the admin routes unmounted
    pub admin_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        export_service: Arc<ExportService>,
        broker: Arc<dyn MessageBroker>,
        queue: impl Into<String>,
        jwt_decoder: JwtDecoder,
    ) -> Self {
        Self {
            export_service,
            broker,
            queue: queue.into(),
            jwt_decoder: Arc::new(jwt_decoder),
            admin_key: None,
        }
    }

    pub fn with_admin_key(mut self, admin_key: Option<String>) -> Self {
        self.admin_key = admin_key.filter(|k| !k.is_empty()).map(Arc::from);
        self
    }
}
