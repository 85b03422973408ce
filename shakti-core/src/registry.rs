use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ShaktiService;

/// Named services, callable from any transport or from other services.
pub struct ServiceRegistry<R, P = ()>
where
    R: Send + 'static,
    P: Send + 'static,
{
    services: BTreeMap<String, Arc<dyn ShaktiService<R, P>>>,
}

impl<R, P> ServiceRegistry<R, P>
where
    R: Send + 'static,
    P: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            services: BTreeMap::new(),
        }
    }

    /// Registers `service` under `name`, replacing any previous one.
    pub fn register<S>(&mut self, name: S, service: Arc<dyn ShaktiService<R, P>>)
    where
        S: Into<String>,
    {
        self.services.insert(name.into(), service);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ShaktiService<R, P>>> {
        self.services.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }
}

impl<R, P> Default for ServiceRegistry<R, P>
where
    R: Send + 'static,
    P: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
