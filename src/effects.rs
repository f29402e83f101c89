use crate::store::Store;

/// Deferred effects that must run outside the main reducer
#[derive(Debug, Clone)]
pub enum Effect {
    /// Schedule a label re-render behind the debounce window.
    RequestTypeset,
    /// Re-render labels right away, bypassing the debouncer.
    TypesetNow,
}

/// Execute a single effect against the store. `now` is the frame
/// timestamp in seconds.
pub fn run(store: &mut Store, effect: Effect, now: f64) {
    match effect {
        Effect::RequestTypeset => {
            store.typeset_debounce.request(now);
        }
        Effect::TypesetNow => {
            store.apply_typeset();
        }
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
    fn request_typeset_only_arms_the_debouncer() {
        let mut s = store();
        let passes = s.typeset_passes();
        run(&mut s, Effect::RequestTypeset, 1.0);
        assert!(s.typeset_debounce.pending());
        assert_eq!(s.typeset_passes(), passes);
    }

    #[test]
    fn typeset_now_runs_a_pass() {
        let mut s = store();
        let passes = s.typeset_passes();
        run(&mut s, Effect::TypesetNow, 1.0);
        assert_eq!(s.typeset_passes(), passes + 1);
    }
}
