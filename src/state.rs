use std::sync::Arc;

use crate::{admin::AdminSite, store::Store};

#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub admin: Option<Arc<AdminSite>>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S) -> Self {
        Self { store, admin: None }
    }

    pub fn with_admin(mut self, admin: AdminSite) -> Self {
        self.admin = Some(Arc::new(admin));
        self
    }
}
