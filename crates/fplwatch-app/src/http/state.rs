// Shared state handed to every handler.

use crate::service::DashboardService;
use crate::session::SessionHandle;

#[derive(Clone)]
pub struct AppState {
    pub service: DashboardService,
    pub session: SessionHandle,
}

impl AppState {
    pub fn new(service: DashboardService, session: SessionHandle) -> Self {
        Self { service, session }
    }
}
