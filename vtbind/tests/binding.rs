//! Table binding, memoization and binder configuration.

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tracing_subscriber::EnvFilter;
use vtbind::{
    bind, implement, interface, Access, BindConfig, BindError, BindResult, Binder, CallShape,
    Implementation, Interface, InterfaceDef, Operation, OperationTable, Policy, Requirement, Slot,
    SlotSource,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vtbind=trace")),
        )
        .with_test_writer()
        .try_init();
}

interface! {
    pub interface Store {
        fn get(&self, key: u64) -> Option<String>;
        fn put(&mut self, key: u64, value: String);
        fn capacity() -> usize;
    }
}

#[derive(Default)]
struct MemStore {
    entries: Vec<(u64, String)>,
}

implement! {
    impl MemStore {
        fn get(&self, key: u64) -> Option<String> {
            self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone())
        }

        fn put(&mut self, key: u64, value: String) {
            self.entries.retain(|(k, _)| *k != key);
            self.entries.push((key, value));
        }

        fn capacity() -> usize {
            usize::MAX
        }
    }
}

// ============================================================
// Binding
// ============================================================

#[test]
fn test_rebinding_yields_identical_slots() {
    init_tracing();
    let first = bind::<MemStore, Store>().expect("bind");
    let second = bind::<MemStore, Store>().expect("bind");

    assert_eq!(first.get_fn, second.get_fn);
    assert_eq!(first.put_fn, second.put_fn);
    assert_eq!(first.capacity_fn, second.capacity_fn);
}

#[test]
fn test_slot_shapes_follow_candidate() {
    let table = bind::<MemStore, Store>().expect("bind");

    assert_eq!(table.get_fn.shape(), CallShape::Bound(Access::Shared));
    assert_eq!(table.put_fn.shape(), CallShape::Bound(Access::Exclusive));
    assert_eq!(table.capacity_fn.shape(), CallShape::Free);
}

#[test]
fn test_store_reuses_table() {
    init_tracing();
    let binder = Binder::new(BindConfig {
        trace_slots: true,
        ..BindConfig::default()
    });

    let first = binder.table::<MemStore, Store>(Policy::Any).expect("bind");
    let second = binder.table::<MemStore, Store>(Policy::Any).expect("bind");

    assert!(std::ptr::eq(first, second));
    assert_eq!(binder.len(), 1);
}

#[test]
fn test_concurrent_first_binds_agree() {
    let binder = Arc::new(Binder::default());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let binder = Arc::clone(&binder);
            thread::spawn(move || {
                let table = binder.table::<MemStore, Store>(Policy::Any).expect("bind");
                table as *const <Store as InterfaceDef>::Table as usize
            })
        })
        .collect();

    let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().expect("thread")).collect();
    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(binder.len(), 1);
}

#[test]
fn test_config_file_drives_binder() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("vtbind.toml");
    std::fs::write(&path, "allow_free_for_bound = false\n").expect("write config");

    let binder = Binder::new(BindConfig::load(&path).expect("load"));
    assert!(!binder.config().allow_free_for_bound);
    assert!(binder.table::<MemStore, Store>(Policy::Any).is_ok());
}

// ============================================================
// Hand-written tables
// ============================================================

enum Beacon {}

#[derive(Debug)]
struct ShortTable {
    ping_fn: Slot<(), u8>,
}

impl InterfaceDef for Beacon {
    type Table = ShortTable;

    fn name() -> &'static str {
        "Beacon"
    }

    fn requirements() -> Vec<Requirement> {
        vec![
            Requirement::free::<(), u8>("ping"),
            Requirement::free::<(), u8>("pong"),
        ]
    }
}

impl OperationTable for ShortTable {
    fn slot_names() -> &'static [&'static str] {
        &["ping_fn"]
    }

    fn assemble(source: &mut SlotSource) -> BindResult<Self> {
        Ok(Self {
            ping_fn: source.take("ping", "ping_fn")?,
        })
    }
}

enum Loose {}

#[derive(Debug)]
struct LooseTable {
    ping_fn: Slot<(), u16>,
}

impl InterfaceDef for Loose {
    type Table = LooseTable;

    fn name() -> &'static str {
        "Loose"
    }

    fn requirements() -> Vec<Requirement> {
        vec![Requirement::free::<(), u8>("ping")]
    }
}

impl OperationTable for LooseTable {
    fn slot_names() -> &'static [&'static str] {
        &["ping_fn"]
    }

    fn assemble(source: &mut SlotSource) -> BindResult<Self> {
        Ok(Self {
            ping_fn: source.take("ping", "ping_fn")?,
        })
    }
}

struct Pinger;

implement! {
    impl Pinger {
        fn ping() -> u8 {
            1
        }

        fn pong() -> u8 {
            2
        }
    }
}

#[test]
fn test_missing_slot_is_reported() {
    let err = bind::<Pinger, Beacon>().unwrap_err();
    match err {
        BindError::MissingSlot {
            interface,
            operation,
            slot,
        } => {
            assert_eq!(interface, "Beacon");
            assert_eq!(operation, "pong");
            assert_eq!(slot, "pong_fn");
        }
        other => panic!("expected MissingSlot, got {other}"),
    }
}

#[test]
fn test_inconsistent_slot_type_is_reported() {
    let err = bind::<Pinger, Loose>().unwrap_err();
    assert_eq!(
        err.to_string(),
        "slot `ping_fn` of `Loose` is declared as `fn() -> u16`, which does not match its operation"
    );
}

enum Reader {}

struct ReaderTable {
    read_fn: Slot<(), u32>,
}

struct Celsius {
    degrees: u32,
}

impl InterfaceDef for Reader {
    type Table = ReaderTable;

    fn name() -> &'static str {
        "Reader"
    }

    fn requirements() -> Vec<Requirement> {
        vec![Requirement::method::<Celsius, (), u32>("read", Access::Shared)]
    }
}

impl OperationTable for ReaderTable {
    fn slot_names() -> &'static [&'static str] {
        &["read_fn"]
    }

    fn assemble(source: &mut SlotSource) -> BindResult<Self> {
        Ok(Self {
            read_fn: source.take("read", "read_fn")?,
        })
    }
}

struct Fahrenheit(f32);

impl Implementation for Fahrenheit {
    fn operations() -> Vec<Operation> {
        vec![Operation::shared::<Celsius, (), u32>("read", |c, ()| c.degrees)]
    }
}

#[test]
fn test_foreign_receiver_is_never_bound() {
    let mut reading = Fahrenheit(1.0);

    let err = Interface::<Reader>::make(&mut reading).unwrap_err();
    assert!(matches!(err, BindError::NonConformant(_)));

    let report = err.report().expect("report");
    assert!(report.satisfied.is_empty());
    assert_eq!(report.mismatched.len(), 1);
    assert_eq!(report.mismatched[0].name, "read");
    assert_eq!(report.mismatched[0].found.to_string(), "fn(&Celsius) -> u32");
    assert_eq!(reading.0, 1.0);
}

// ============================================================
// Properties
// ============================================================

proptest! {
    #[test]
    fn prop_fresh_binders_bind_identically(rounds in 1usize..6) {
        let reference = bind::<MemStore, Store>().expect("bind");
        for _ in 0..rounds {
            let binder = Binder::default();
            let table = binder.table::<MemStore, Store>(Policy::Any).expect("bind");
            prop_assert_eq!(table.get_fn, reference.get_fn);
            prop_assert_eq!(table.put_fn, reference.put_fn);
            prop_assert_eq!(table.capacity_fn, reference.capacity_fn);
        }
    }
}
