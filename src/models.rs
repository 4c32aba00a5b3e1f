use crate::db::Store;

/// Shared state handed to every HTTP handler.
pub struct AppState {
    pub store: Store,
}
