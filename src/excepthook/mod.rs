//! Installation of the ticket pipeline into a host's exception hook
//!
//! Two hosts are supported:
//!
//! - [`HostKind::Generic`]: the process panic hook (`std::panic::set_hook`)
//! - [`HostKind::Gui`]: the GUI exception formatter slot in [`gui`]
//!
//! Installing saves whatever hook was active, then replaces it with one that
//! calls the saved hook first and files a ticket afterwards. Destroying puts
//! the saved hook back. Only one installation exists per process; it is
//! tracked by a lock-protected registration and only the manager that made
//! it can remove it.

pub mod gui;
mod panic_host;

use crate::app::TicketsApp;
use crate::error::{Result, TicketsError};
use crate::trace::ExceptionInfo;
use gui::{ActiveHook, GuiHostStrategy};
use once_cell::sync::Lazy;
use panic_host::{PanicHook, PanicHostStrategy};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use tracing::{debug, error, info};

/// Name of the thread the ticket pipeline runs on
pub const PIPELINE_THREAD: &str = "tickets-excepthook";

/// Host application whose exception hook is patched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKind {
    /// Plain process: the panic hook
    #[default]
    Generic,
    /// GUI host: the exception formatter slot
    Gui,
}

impl std::fmt::Display for HostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Gui => write!(f, "gui"),
        }
    }
}

/// The hook that was active before ours
pub(crate) enum SavedHook {
    Panic(Arc<PanicHook>),
    Gui(ActiveHook),
}

/// Install/restore for one host kind
pub(crate) trait HostStrategy: Send + Sync {
    /// Replace the host hook with one running the pipeline for `app`
    ///
    /// Returns the replaced hook, or `None` when ours is already active.
    fn install(&self, app: &Arc<TicketsApp>) -> Result<Option<SavedHook>>;

    /// Put a previously saved hook back
    fn restore(&self, saved: &SavedHook) -> Result<()>;
}

static PANIC_HOST: PanicHostStrategy = PanicHostStrategy;
static GUI_HOST: GuiHostStrategy = GuiHostStrategy;

fn strategy_for(kind: HostKind) -> &'static dyn HostStrategy {
    match kind {
        HostKind::Generic => &PANIC_HOST,
        HostKind::Gui => &GUI_HOST,
    }
}

#[derive(Default)]
struct HookRegistration {
    saved: Option<SavedHook>,
    host: Option<HostKind>,
    owner: Option<u64>,
}

static REGISTRATION: Lazy<Mutex<HookRegistration>> =
    Lazy::new(|| Mutex::new(HookRegistration::default()));

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

fn registration() -> Result<MutexGuard<'static, HookRegistration>> {
    REGISTRATION
        .lock()
        .map_err(|e| TicketsError::HookSlot(format!("hook registration poisoned: {e}")))
}

/// Host kind of the current installation, if any
pub fn installed_host() -> Result<Option<HostKind>> {
    Ok(registration()?.host)
}

/// Installs and removes the ticket pipeline for one app
pub struct ExceptHookManager {
    id: u64,
    app: Arc<TicketsApp>,
}

impl std::fmt::Debug for ExceptHookManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExceptHookManager").field("id", &self.id).finish()
    }
}

impl ExceptHookManager {
    pub fn new(app: Arc<TicketsApp>) -> Self {
        Self {
            id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
            app,
        }
    }

    pub fn app(&self) -> &Arc<TicketsApp> {
        &self.app
    }

    /// Install the hook for the configured host
    ///
    /// Does nothing when `excepthook_enabled` is off or a hook is already
    /// installed.
    pub fn init(&self) -> Result<()> {
        let settings = self.app.settings();
        if !settings.excepthook_enabled {
            info!("Exception hook disabled");
            return Ok(());
        }

        let mut registration = registration()?;
        if registration.saved.is_some() {
            info!("Exception hook already installed");
            return Ok(());
        }

        let host = settings.host;
        match strategy_for(host).install(&self.app)? {
            Some(saved) => {
                registration.saved = Some(saved);
                registration.host = Some(host);
                registration.owner = Some(self.id);
                info!("Installed exception hook for {} host", host);
            },
            None => info!("Exception hook for {} host is already ours", host),
        }
        Ok(())
    }

    /// Did this manager install the active hook?
    pub fn is_installed(&self) -> bool {
        registration().is_ok_and(|r| r.owner == Some(self.id))
    }

    /// Restore the hook that was active before [`init`](Self::init)
    pub fn destroy(&self) -> Result<()> {
        let mut registration = registration()?;
        if registration.owner != Some(self.id) {
            info!("Exception hook not installed by this app, nothing to restore");
            return Ok(());
        }

        // A failed restore leaves our hook in the slot, so the registration
        // must keep saying so
        if let (Some(saved), Some(host)) = (&registration.saved, registration.host) {
            strategy_for(host).restore(saved)?;
            info!("Restored previous exception hook for {} host", host);
        }
        *registration = HookRegistration::default();
        Ok(())
    }
}

/// Run the exception ticket pipeline on its own thread and wait for it
///
/// Errors and panics in the pipeline are logged and go no further.
pub(crate) fn run_pipeline(app: &Arc<TicketsApp>, exc: ExceptionInfo) {
    let app = Arc::clone(app);
    let confirm = app.settings().excepthook_confirm;

    let handle = thread::Builder::new()
        .name(PIPELINE_THREAD.to_string())
        .spawn(move || app.create_exception_ticket(&exc, confirm));

    match handle.map(thread::JoinHandle::join) {
        Ok(Ok(Ok(Some(ticket)))) => info!("Exception reported as Ticket #{}", ticket.id),
        Ok(Ok(Ok(None))) => debug!("No ticket created for exception"),
        Ok(Ok(Err(e))) => error!("Failed to create exception ticket: {}", e),
        Ok(Err(_)) => error!("Exception ticket pipeline panicked"),
        Err(e) => error!("Failed to start exception ticket pipeline: {}", e),
    }
}

/// Is the current thread the pipeline thread?
pub(crate) fn on_pipeline_thread() -> bool {
    thread::current().name() == Some(PIPELINE_THREAD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::test_utils::{MemoryStore, include_all, test_app};
    use serial_test::serial;

    fn gui_app(store: &Arc<MemoryStore>, enabled: bool) -> Arc<TicketsApp> {
        let settings = Settings {
            host: HostKind::Gui,
            excepthook_enabled: enabled,
            excepthook_confirm: false,
            ..include_all()
        };
        Arc::new(test_app(store, settings))
    }

    #[test]
    fn test_host_kind_serde() {
        assert_eq!(serde_yaml::to_string(&HostKind::Gui).unwrap().trim(), "gui");
        let kind: HostKind = serde_yaml::from_str("generic").unwrap();
        assert_eq!(kind, HostKind::Generic);
    }

    #[test]
    #[serial]
    fn test_disabled_init_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let manager = ExceptHookManager::new(gui_app(&store, false));

        manager.init().unwrap();
        assert!(!manager.is_installed());
        assert!(!gui::current_hook().unwrap().is_tickets());
    }

    #[test]
    #[serial]
    fn test_second_manager_cannot_install_or_destroy() {
        let store = Arc::new(MemoryStore::new());
        let first = ExceptHookManager::new(gui_app(&store, true));
        let second = ExceptHookManager::new(gui_app(&store, true));

        first.init().unwrap();
        second.init().unwrap();
        assert!(first.is_installed());
        assert!(!second.is_installed());

        second.destroy().unwrap();
        assert!(gui::current_hook().unwrap().is_tickets());
        assert_eq!(installed_host().unwrap(), Some(HostKind::Gui));

        first.destroy().unwrap();
        assert!(!first.is_installed());
        assert_eq!(installed_host().unwrap(), None);
        assert!(!gui::current_hook().unwrap().is_tickets());
    }

    #[test]
    #[serial]
    fn test_destroy_without_init_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let manager = ExceptHookManager::new(gui_app(&store, true));
        manager.destroy().unwrap();
        assert!(!manager.is_installed());
    }
}
