use crate::effects::Effect;
use crate::store::Store;

/// Actions that can be dispatched to modify the explorer state
#[derive(Debug, Clone)]
pub enum Action {
    /// Select a node by id; selecting an equation expands it, selecting
    /// while another equation is selected collapses that one first.
    SelectNode { id: String },
    /// Drop the current selection, collapsing its equation if expanded.
    ClearSelection,
    /// Toggle node label visibility
    SetShowLabels { show: bool },
    /// A node drag gesture ended.
    NodeDragReleased,
    /// Ask for a debounced re-render of all labels.
    RequestTypeset,
}

/// Apply a single action to modify the store state
pub fn update(store: &mut Store, action: Action) -> Vec<Effect> {
    match action {
        Action::SelectNode { id } => {
            if store.graph.select(&id) {
                store.layout_reheat_needed = true;
                vec![Effect::RequestTypeset]
            } else {
                vec![]
            }
        }
        Action::ClearSelection => {
            if store.graph.clear_selection() {
                store.layout_reheat_needed = true;
                vec![Effect::RequestTypeset]
            } else {
                vec![]
            }
        }
        Action::SetShowLabels { show } => {
            store.show_labels = show;
            vec![]
        }
        Action::NodeDragReleased => {
            // Re-typeset right away, skipping the debounce window.
            vec![Effect::TypesetNow]
        }
        Action::RequestTypeset => {
            vec![Effect::RequestTypeset]
        }
    }
}
