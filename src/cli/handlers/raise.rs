//! Handler for the `raise` command
//!
//! Installs the exception hook for the configured host, raises an
//! unhandled exception through it and removes the hook again. Useful to
//! check a site configuration end to end.

use super::base::HandlerContext;
use crate::error::Result;
use crate::excepthook::{ExceptHookManager, HostKind, gui};
use crate::trace::{ExceptionInfo, parse_backtrace};
use std::backtrace::Backtrace;
use std::sync::Arc;
use std::thread;

/// Exception type reported by the GUI host
const RAISED_TYPE: &str = "RuntimeError";

/// Detail level of the GUI report: the full trace
const GUI_DETAIL: u8 = 2;

pub fn handle_raise(message: String, ctx: &HandlerContext) -> Result<()> {
    let manager = ExceptHookManager::new(Arc::clone(&ctx.app));
    manager.init()?;

    let host = ctx.settings.host;
    let raised = match host {
        HostKind::Generic => raise_panic(message.clone()),
        HostKind::Gui => Ok(raise_gui(&message)),
    };
    manager.destroy()?;
    let report = raised?;

    if ctx.formatter.is_json() {
        return ctx.formatter.print_json(&serde_json::json!({
            "host": host,
            "message": message,
            "report": report,
        }));
    }
    if let Some(report) = report {
        ctx.info(&report);
    }
    ctx.success(&format!("Raised '{message}' on the {host} host"));
    Ok(())
}

/// Panic on a worker thread so the panic hook fires
fn raise_panic(message: String) -> Result<Option<String>> {
    let worker: thread::JoinHandle<()> = thread::Builder::new()
        .name("raise".to_string())
        .spawn(move || panic!("{message}"))?;
    // The panic is the point; its payload has already been reported
    let _ = worker.join();
    Ok(None)
}

/// Report an exception through the GUI slot and return the text to show
fn raise_gui(message: &str) -> Option<String> {
    let frames = parse_backtrace(&Backtrace::force_capture().to_string());
    let exc = ExceptionInfo::new(RAISED_TYPE, message, frames);
    Some(gui::report_exception(&exc, GUI_DETAIL))
}
