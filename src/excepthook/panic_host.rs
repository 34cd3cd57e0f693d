//! The process panic hook as an exception hook host

use super::{HostStrategy, SavedHook, on_pipeline_thread, run_pipeline};
use crate::app::TicketsApp;
use crate::error::{Result, TicketsError};
use crate::trace::ExceptionInfo;
use std::backtrace::Backtrace;
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;

pub(crate) type PanicHook = dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static;

/// Chains the ticket pipeline after the active panic hook
///
/// std does not expose whether the active hook is the built-in one, so the
/// active hook is always saved and chained, default or not.
pub(crate) struct PanicHostStrategy;

impl HostStrategy for PanicHostStrategy {
    fn install(&self, app: &Arc<TicketsApp>) -> Result<Option<SavedHook>> {
        if std::thread::panicking() {
            return Err(TicketsError::HookSlot(
                "cannot replace the panic hook while panicking".to_string(),
            ));
        }

        let previous: Arc<PanicHook> = Arc::from(panic::take_hook());
        let chained = Arc::clone(&previous);
        let app = Arc::clone(app);

        panic::set_hook(Box::new(move |info| {
            chained(info);
            // A panic inside the pipeline must not file another ticket
            if on_pipeline_thread() {
                return;
            }
            let backtrace = Backtrace::force_capture();
            run_pipeline(&app, ExceptionInfo::from_panic(info, &backtrace));
        }));

        Ok(Some(SavedHook::Panic(previous)))
    }

    fn restore(&self, saved: &SavedHook) -> Result<()> {
        let SavedHook::Panic(previous) = saved else {
            return Err(TicketsError::HookSlot(
                "saved hook does not belong to the panic host".to_string(),
            ));
        };
        if std::thread::panicking() {
            return Err(TicketsError::HookSlot(
                "cannot restore the panic hook while panicking".to_string(),
            ));
        }

        let previous = Arc::clone(previous);
        drop(panic::take_hook());
        panic::set_hook(Box::new(move |info| previous(info)));
        Ok(())
    }
}
