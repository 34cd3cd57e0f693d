//! Integration tests for the panic hook host
//!
//! These tests replace the process-wide panic hook and must not run
//! concurrently.

use pipeline_tickets::core::{ExecutionContext, TICKET_KIND, TicketFields};
use pipeline_tickets::hooks::EventsHook;
use pipeline_tickets::{ExceptHookManager, ExceptionInfo, FileStore, Result, Settings, TicketsApp};
use serial_test::serial;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tempfile::TempDir;

fn settings() -> Settings {
    Settings {
        excepthook_includes: vec!["*".to_string()],
        excepthook_confirm: false,
        project_id: Some(65),
        ..Settings::default()
    }
}

fn store(temp_dir: &TempDir) -> Arc<FileStore> {
    let settings = settings();
    Arc::new(FileStore::new(temp_dir.path().join("store"), settings.schema.values()))
}

/// Install a hook counting calls, standing in for the host's own hook
fn install_counting_hook() -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    panic::set_hook(Box::new(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    }));
    calls
}

fn panic_on_thread(message: &'static str) {
    let worker: thread::JoinHandle<()> = thread::spawn(move || panic!("{message}"));
    assert!(worker.join().is_err());
}

#[test]
#[serial]
fn test_panic_chains_previous_hook_and_files_ticket() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);
    let calls = install_counting_hook();

    let app = Arc::new(TicketsApp::new(settings(), store.clone()));
    let manager = ExceptHookManager::new(app);
    manager.init().unwrap();
    assert!(manager.is_installed());

    panic_on_thread("boom");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let records = store.load_all(TICKET_KIND).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["title"], "[unhandled] panic - boom ");
    assert_eq!(records[0]["project"]["id"], 65);

    // Same panic again: count goes up, no new ticket
    panic_on_thread("boom");
    let records = store.load_all(TICKET_KIND).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["sg_count"], 1);

    manager.destroy().unwrap();
    assert!(!manager.is_installed());

    // Restored: only the previous hook runs
    panic_on_thread("boom");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(store.load_all(TICKET_KIND).unwrap()[0]["sg_count"], 1);

    drop(panic::take_hook());
}

struct PanickingHooks;

impl EventsHook for PanickingHooks {
    fn before_create_ticket(
        &self,
        _app: &TicketsApp,
        _fields: TicketFields,
        _context: ExecutionContext,
        _error: Option<String>,
        _exc: Option<&ExceptionInfo>,
    ) -> Result<(TicketFields, ExecutionContext, Option<String>)> {
        panic!("policy hook bug");
    }
}

#[test]
#[serial]
fn test_panicking_policy_hook_is_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);
    let calls = install_counting_hook();

    let app = TicketsApp::new(settings(), store.clone()).with_hooks(Arc::new(PanickingHooks));
    let manager = ExceptHookManager::new(Arc::new(app));
    manager.init().unwrap();

    panic_on_thread("boom");

    // The policy hook's own panic reaches the previous hook too, but files nothing
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(store.load_all(TICKET_KIND).unwrap().is_empty());

    manager.destroy().unwrap();
    drop(panic::take_hook());
}

#[test]
#[serial]
fn test_excluded_module_files_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);
    let calls = install_counting_hook();

    let settings = Settings {
        excepthook_excludes: vec!["*".to_string()],
        ..settings()
    };
    let manager = ExceptHookManager::new(Arc::new(TicketsApp::new(settings, store.clone())));
    manager.init().unwrap();

    panic_on_thread("boom");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(store.load_all(TICKET_KIND).unwrap().is_empty());

    manager.destroy().unwrap();
    drop(panic::take_hook());
}

#[test]
#[serial]
fn test_init_and_destroy_twice_chain_previous_hook_once() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);
    let calls = install_counting_hook();

    let manager = ExceptHookManager::new(Arc::new(TicketsApp::new(settings(), store.clone())));
    manager.init().unwrap();
    manager.init().unwrap();

    panic_on_thread("boom");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.load_all(TICKET_KIND).unwrap().len(), 1);

    manager.destroy().unwrap();
    manager.destroy().unwrap();
    assert!(!manager.is_installed());

    panic_on_thread("boom");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.load_all(TICKET_KIND).unwrap().len(), 1);

    drop(panic::take_hook());
}

/// Calls `destroy` while its thread unwinds
struct DestroyOnDrop {
    manager: Arc<ExceptHookManager>,
    failed: Arc<AtomicUsize>,
}

impl Drop for DestroyOnDrop {
    fn drop(&mut self) {
        if self.manager.destroy().is_err() {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
#[serial]
fn test_failed_destroy_keeps_registration() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);
    let calls = install_counting_hook();

    let manager = Arc::new(ExceptHookManager::new(Arc::new(TicketsApp::new(
        settings(),
        store.clone(),
    ))));
    manager.init().unwrap();

    let failed = Arc::new(AtomicUsize::new(0));
    let guard = DestroyOnDrop {
        manager: Arc::clone(&manager),
        failed: Arc::clone(&failed),
    };
    let worker: thread::JoinHandle<()> = thread::spawn(move || {
        let _guard = guard;
        panic!("first");
    });
    assert!(worker.join().is_err());

    // The panic hook cannot be swapped while unwinding, so ours is still active
    assert_eq!(failed.load(Ordering::SeqCst), 1);
    assert!(manager.is_installed());

    // Nobody else may wrap the live hook again
    let other = ExceptHookManager::new(Arc::new(TicketsApp::new(settings(), store.clone())));
    other.init().unwrap();
    assert!(!other.is_installed());

    panic_on_thread("second");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let records = store.load_all(TICKET_KIND).unwrap();
    assert_eq!(records.len(), 2);
    let second = records
        .iter()
        .find(|r| r["title"] == "[unhandled] panic - second ")
        .unwrap();
    assert_eq!(second.get("sg_count").and_then(|c| c.as_i64()).unwrap_or(0), 0);

    manager.destroy().unwrap();
    assert!(!manager.is_installed());
    drop(panic::take_hook());
}
