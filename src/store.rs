use crate::catalog::Catalog;
use crate::debounce::Debouncer;
use crate::graph_state::{BuildError, GraphState, build_graph};
use crate::typeset::{FormulaRenderer, UnicodeFormatter};

/// Quiescence window before a typeset pass runs, in seconds.
pub const TYPESET_DEBOUNCE_SECONDS: f64 = 0.75;

pub struct Store {
    pub graph: GraphState,
    pub show_labels: bool,
    pub layout_reheat_needed: bool,
    pub typeset_debounce: Debouncer,
    renderer: Box<dyn FormulaRenderer>,
    typeset_passes: u64,
}

impl Store {
    pub fn new(catalog: &Catalog) -> Result<Self, BuildError> {
        Self::with_renderer(catalog, Box::new(UnicodeFormatter))
    }

    pub fn with_renderer(
        catalog: &Catalog,
        renderer: Box<dyn FormulaRenderer>,
    ) -> Result<Self, BuildError> {
        let graph = build_graph(catalog)?;
        let mut store = Self {
            graph,
            show_labels: true,
            layout_reheat_needed: false,
            typeset_debounce: Debouncer::new(TYPESET_DEBOUNCE_SECONDS),
            renderer,
            typeset_passes: 0,
        };
        // Initial labels are raw formulas; render them before first paint.
        store.apply_typeset();
        Ok(store)
    }

    /// Re-render every node label from its raw formula. Best-effort per
    /// node: a formula that fails to render keeps its raw text.
    pub fn apply_typeset(&mut self) {
        let ids = self.graph.node_ids();
        for id in ids {
            let Some(idx) = self.graph.index_of(&id) else {
                continue;
            };
            let Some(entity) = self.graph.entity(&id) else {
                continue;
            };
            let formula = entity.formula.clone();
            let label = match self.renderer.typeset(&formula) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("typeset failed for {id}: {e}");
                    formula
                }
            };
            if let Some(node) = self.graph.display_mut().node_mut(idx) {
                node.set_label(label);
            }
        }
        self.typeset_passes += 1;
        log::debug!("typeset pass {} complete", self.typeset_passes);
    }

    pub fn typeset_passes(&self) -> u64 {
        self.typeset_passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::load_catalog;

    fn store() -> Store {
        Store::new(&load_catalog().unwrap()).unwrap()
    }

    #[test]
    fn new_store_has_rendered_labels() {
        let s = store();
        assert_eq!(s.typeset_passes(), 1);
        let idx = s.graph.index_of("equation_MassEnergyEquivalence").unwrap();
        let label = s.graph.display().node(idx).unwrap().label();
        assert_eq!(label, "E=mc²");
    }

    #[test]
    fn typeset_covers_expanded_derivations() {
        let mut s = store();
        s.graph.select("equation_MassEnergyEquivalence");
        s.apply_typeset();

        let idx = s
            .graph
            .index_of("derivation_c_from_MassEnergyEquivalence")
            .unwrap();
        let label = s.graph.display().node(idx).unwrap().label();
        assert!(!label.contains('\\'), "label still raw: {label}");
    }
}
