pub mod actions;
pub mod app;
pub mod catalog;
pub mod debounce;
pub mod effects;
pub mod graph_state;
pub mod graph_view;
pub mod layout_force;
pub mod native;
pub mod node_shapes;
pub mod state;
pub mod store;
pub mod typeset;
pub mod web;

use app::ExplorerApp;
use store::Store;

/// Build the application from the built-in catalog. Fails if the catalog
/// does not validate, which would be a programming error in the data
/// tables rather than a runtime condition.
pub fn create_app(
    _cc: &eframe::CreationContext<'_>,
) -> Result<ExplorerApp, Box<dyn std::error::Error + Send + Sync>> {
    let catalog = catalog::load_catalog()?;
    let store = Store::new(&catalog)?;
    log::info!(
        "catalog loaded: {} nodes, {} edges",
        store.graph.node_count(),
        store.graph.edge_count()
    );
    Ok(ExplorerApp::new(store))
}
