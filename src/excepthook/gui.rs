//! Exception hook slot of GUI hosts
//!
//! GUI hosts do not let unhandled exceptions reach the process hook.
//! Instead they call [`report_exception`], which formats the exception
//! through whatever hook occupies the slot, and show the returned text to
//! the user. Hosts and plugins may replace the slot with [`set_hook`].

use super::{HostStrategy, SavedHook, run_pipeline};
use crate::app::TicketsApp;
use crate::error::{Result, TicketsError};
use crate::trace::ExceptionInfo;
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

/// A custom GUI exception formatter: `(exception, detail level) -> text`
pub type GuiExceptionHook = dyn Fn(&ExceptionInfo, u8) -> String + Send + Sync;

/// The hook occupying the GUI slot
#[derive(Clone)]
pub enum ActiveHook {
    /// [`format_gui_exception`]
    Builtin,
    /// A hook installed by the host or another plugin
    Custom(Arc<GuiExceptionHook>),
    /// The ticket pipeline, chained after the hook it replaced
    Tickets(TicketsGuiHook),
}

impl std::fmt::Debug for ActiveHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin => write!(f, "Builtin"),
            Self::Custom(hook) => write!(f, "Custom({:p})", Arc::as_ptr(hook)),
            Self::Tickets(hook) => f.debug_tuple("Tickets").field(&hook.previous).finish(),
        }
    }
}

impl ActiveHook {
    /// Wrap a formatter function
    pub fn custom<F>(hook: F) -> Self
    where
        F: Fn(&ExceptionInfo, u8) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(hook))
    }

    pub const fn is_tickets(&self) -> bool {
        matches!(self, Self::Tickets(_))
    }

    /// Is `other` the very same hook?
    ///
    /// Custom hooks compare by identity, not behaviour.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Builtin, Self::Builtin) => true,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            (Self::Tickets(a), Self::Tickets(b)) => Arc::ptr_eq(&a.app, &b.app),
            _ => false,
        }
    }

    fn call(&self, exc: &ExceptionInfo, detail: u8) -> String {
        match self {
            Self::Builtin => format_gui_exception(exc, detail),
            Self::Custom(hook) => hook(exc, detail),
            Self::Tickets(hook) => hook.call(exc, detail),
        }
    }
}

/// The ticket pipeline as a GUI hook
#[derive(Clone)]
pub struct TicketsGuiHook {
    previous: Box<ActiveHook>,
    app: Arc<TicketsApp>,
}

impl TicketsGuiHook {
    fn call(&self, exc: &ExceptionInfo, detail: u8) -> String {
        let text = self.previous.call(exc, detail);
        run_pipeline(&self.app, exc.clone());
        text
    }
}

static SLOT: Lazy<RwLock<ActiveHook>> = Lazy::new(|| RwLock::new(ActiveHook::Builtin));

/// The built-in formatter
///
/// Detail `0` gives the message, `1` the type and message, anything higher
/// the full trace.
pub fn format_gui_exception(exc: &ExceptionInfo, detail: u8) -> String {
    match detail {
        0 => exc.message().to_string(),
        1 => format!("{}: {}", exc.type_name(), exc.message()),
        _ => exc.format(),
    }
}

/// The hook currently in the slot
pub fn current_hook() -> Result<ActiveHook> {
    SLOT.read()
        .map(|hook| hook.clone())
        .map_err(|e| TicketsError::HookSlot(format!("GUI hook slot poisoned: {e}")))
}

/// Replace the hook in the slot
pub fn set_hook(hook: ActiveHook) -> Result<()> {
    let mut slot = SLOT
        .write()
        .map_err(|e| TicketsError::HookSlot(format!("GUI hook slot poisoned: {e}")))?;
    *slot = hook;
    Ok(())
}

/// Report an unhandled exception the way the GUI host does
///
/// Returns the text to show. The slot lock is not held while the hook runs.
pub fn report_exception(exc: &ExceptionInfo, detail: u8) -> String {
    match current_hook() {
        Ok(hook) => hook.call(exc, detail),
        Err(e) => {
            tracing::warn!("{}", e);
            format_gui_exception(exc, detail)
        },
    }
}

pub(crate) struct GuiHostStrategy;

impl HostStrategy for GuiHostStrategy {
    fn install(&self, app: &Arc<TicketsApp>) -> Result<Option<SavedHook>> {
        let mut slot = SLOT
            .write()
            .map_err(|e| TicketsError::HookSlot(format!("GUI hook slot poisoned: {e}")))?;
        if slot.is_tickets() {
            return Ok(None);
        }

        let previous = slot.clone();
        *slot = ActiveHook::Tickets(TicketsGuiHook {
            previous: Box::new(previous.clone()),
            app: Arc::clone(app),
        });
        Ok(Some(SavedHook::Gui(previous)))
    }

    fn restore(&self, saved: &SavedHook) -> Result<()> {
        match saved {
            SavedHook::Gui(previous) => set_hook(previous.clone()),
            SavedHook::Panic(_) => Err(TicketsError::HookSlot(
                "saved hook does not belong to the GUI host".to_string(),
            )),
        }
    }
}
