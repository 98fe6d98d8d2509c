use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::routes::{RouteName, RouteParams};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum NavigationOperation {
    Navigate { route: RouteName, params: RouteParams },
    GoBack,
    /// Swaps the root navigator, e.g. after sign-in.
    ResetRoot { route: RouteName },
}

impl Operation for NavigationOperation {
    type Output = ();
}

pub struct Navigation<Ev> {
    context: CapabilityContext<NavigationOperation, Ev>,
}

impl<Ev> Capability<Ev> for Navigation<Ev> {
    type Operation = NavigationOperation;
    type MappedSelf<MappedEv> = Navigation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Navigation::new(self.context.map_event(f))
    }
}

impl<Ev> Navigation<Ev>
where
    Ev: Send + 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<NavigationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn navigate(&self, route: RouteName, params: RouteParams) {
        self.notify(NavigationOperation::Navigate { route, params });
    }

    pub fn go_back(&self) {
        self.notify(NavigationOperation::GoBack);
    }

    pub fn reset_root(&self, route: RouteName) {
        self.notify(NavigationOperation::ResetRoot { route });
    }

    fn notify(&self, operation: NavigationOperation) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(operation).await;
        });
    }
}
