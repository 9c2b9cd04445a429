use std::sync::{Arc, RwLock};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::clients::ResourceClient;
use crate::session::Session;
use crate::sync::{DeletionCommander, ListPoller, PollSettings, Reconciler};

/// One mounted dashboard session: the reconciler, its list poller and the
/// deletion commander bound to them.
pub struct Dashboard {
    client: Arc<dyn ResourceClient>,
    reconciler: Arc<Reconciler>,
    list_poller: ListPoller,
    commander: DeletionCommander,
}

impl Dashboard {
    pub fn mount(client: Arc<dyn ResourceClient>, settings: PollSettings) -> Self {
        let reconciler = Reconciler::new(client.clone(), settings);
        let list_poller = ListPoller::start(client.clone(), &reconciler, settings);
        let commander =
            DeletionCommander::new(client.clone(), reconciler.clone(), settings.timeout);

        Self {
            client,
            reconciler,
            list_poller,
            commander,
        }
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    pub fn commander(&self) -> &DeletionCommander {
        &self.commander
    }

    pub fn certificate_url(&self, name: &str) -> Option<String> {
        self.reconciler
            .summary(name)
            .map(|s| self.client.certificate_download_url(&s))
    }

    pub fn is_running(&self) -> bool {
        self.list_poller.is_alive()
    }

    /// Cancels every timer. The dashboard is inert afterwards.
    pub fn unmount(&self) {
        self.list_poller.stop();
        self.reconciler.shutdown();
    }
}

/// Mounts the dashboard while the session is authenticated.
pub struct DashboardHost {
    client: Arc<dyn ResourceClient>,
    settings: PollSettings,
    session: Arc<Session>,
    mounted: RwLock<Option<Arc<Dashboard>>>,
}

impl DashboardHost {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        settings: PollSettings,
        session: Arc<Session>,
    ) -> Self {
        Self {
            client,
            settings,
            session,
            mounted: RwLock::new(None),
        }
    }

    pub fn current(&self) -> Option<Arc<Dashboard>> {
        self.mounted.read().unwrap().clone()
    }

    /// Mounts the dashboard if the session is authenticated right now.
    ///
    /// The session is re-checked under the `mounted` lock.
    pub fn mount(&self) -> bool {
        let mut mounted = self.mounted.write().unwrap();
        if !self.session.is_authenticated() {
            debug!("not mounting dashboard, session is logged out");
            return false;
        }
        if mounted.is_none() {
            info!("mounting dashboard");
            *mounted = Some(Arc::new(Dashboard::mount(self.client.clone(), self.settings)));
        }
        true
    }

    pub fn unmount(&self) {
        let dashboard = self.mounted.write().unwrap().take();
        if let Some(dashboard) = dashboard {
            info!("unmounting dashboard");
            dashboard.unmount();
        }
    }

    pub async fn run(
        self: Arc<Self>,
        mut authenticated: watch::Receiver<bool>,
        mut shutdown: watch::Receiver<()>,
    ) {
        loop {
            if *authenticated.borrow_and_update() {
                self.mount();
            } else {
                self.unmount();
            }

            tokio::select! {
                changed = authenticated.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = shutdown.changed() => {
                    info!("dashboard host shutting down");
                    break;
                }
            }
        }
        self.unmount();
    }
}
