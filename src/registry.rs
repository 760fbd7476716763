use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    sync::Arc,
};

use log::debug;

use crate::binding::{Bindable, BindingPlan};

/// Cache of [`BindingPlan`]s, keyed by target type.
///
/// Building a plan means synthesizing setter names and probing the registration list for every
/// column, which would be prohibitively expensive per row and is still wasteful per reader if an
/// application opens many cursors for the same target type. Readers constructed with
/// [`crate::Reader::with_registry`] share plans through a registry, so the construction cost is
/// paid once per distinct target type.
///
/// A fully built plan is immutable and handed out as [`Arc`], so it can be shared freely. The
/// registry itself is unsynchronized; to share one across threads wrap it in a lock (a plain
/// `Mutex<BindingRegistry>` is sufficient, lookups are cheap).
///
/// A cached plan is only served if it was built from the same column set the caller presents.
/// Seeing the same target type with a different column set (a different query, say) replaces the
/// cached plan. This guards the invariant that a plan is never applied to a cursor with a column
/// set differing from the one it was built from.
pub struct BindingRegistry {
    plans: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    builds: usize,
}

impl BindingRegistry {
    /// An empty registry. Plans are built on first use.
    pub fn new() -> Self {
        BindingRegistry {
            plans: HashMap::new(),
            builds: 0,
        }
    }

    /// The cached plan for `T`, or a freshly built one on a cache miss.
    pub fn plan_for<T>(&mut self, column_names: &[String]) -> Arc<BindingPlan<T>>
    where
        T: Bindable,
    {
        let key = TypeId::of::<T>();
        if let Some(cached) = self.plans.get(&key) {
            let plan = cached
                .downcast_ref::<Arc<BindingPlan<T>>>()
                .expect("Registry entries are keyed by the type id of their plans target type.");
            if plan.columns() == column_names {
                return Arc::clone(plan);
            }
            debug!(
                "Column set changed for `{}`. Replacing the cached binding plan.",
                type_name::<T>()
            );
        }
        self.builds += 1;
        let plan = Arc::new(BindingPlan::<T>::build(column_names));
        self.plans.insert(key, Box::new(Arc::clone(&plan)));
        plan
    }

    /// Number of plans built so far, i.e. the number of cache misses. Cache hits do not touch the
    /// registration list of the target type at all, which this counter makes observable.
    pub fn plan_builds(&self) -> usize {
        self.builds
    }
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
