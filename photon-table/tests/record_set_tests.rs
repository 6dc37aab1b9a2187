use std::sync::{Arc, Mutex};

use photon_column::{ColumnData, ColumnDataFactory, NullableColumnData, PlainColumnData};
use photon_convert::{AnyValue, Error};
use photon_table::{
    CollectionChange, Column, Record, RecordChange, RecordSet, RecordSetConfig,
};
use photon_test_utils::init_tracing_for_tests;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn greetings() -> RecordSet {
    let mut set = RecordSet::new();
    set.add_columns([
        Column::new::<i32>("Id"),
        Column::new::<String>("Greeting"),
    ])
    .unwrap();
    set
}

fn add_row(set: &mut RecordSet, id: i32, greeting: &str) -> Record {
    let record = Record::new();
    set.add(&record).unwrap();
    record.set_field_by_name(set, "Id", id).unwrap();
    record
        .set_field_by_name(set, "Greeting", greeting.to_string())
        .unwrap();
    record
}

fn rows(set: &RecordSet) -> Vec<String> {
    set.iter()
        .map(|row| {
            format!(
                "{}|{}",
                row.get::<i32>(0).unwrap(),
                row.get_by_name::<String>("Greeting").unwrap()
            )
        })
        .collect()
}

fn find(set: &RecordSet, id: i32) -> Record {
    set.iter()
        .find(|row| row.get::<i32>(0).unwrap() == id)
        .map(|row| row.record().clone())
        .expect("row with id")
}

#[test]
fn freed_slots_are_reused_before_growing() {
    init_tracing_for_tests();

    let mut set = greetings();
    add_row(&mut set, 1, "Goodbye");
    let second = add_row(&mut set, 2, "Au revoir");
    add_row(&mut set, 3, "Auf Wiedersehen");

    assert!(set.remove(&second));
    assert!(!second.is_attached());
    add_row(&mut set, 4, "Dag");

    assert_eq!(rows(&set), vec!["1|Goodbye", "4|Dag", "3|Auf Wiedersehen"]);
    assert_eq!(set.len(), 3);
    assert_eq!(set.capacity(), 4);
}

#[test]
fn appending_past_the_pool_extends_and_grows() {
    let mut set = greetings();
    for id in 1..=4 {
        add_row(&mut set, id, "Hello");
    }
    assert_eq!(set.capacity(), 4);

    let fifth = add_row(&mut set, 5, "Hallo");
    assert_eq!(fifth.handle(), Some(4));
    assert_eq!(set.capacity(), 8);
    assert_eq!(
        rows(&set),
        vec!["1|Hello", "2|Hello", "3|Hello", "4|Hello", "5|Hallo"]
    );
}

#[test]
fn increasing_capacity_keeps_rows() {
    let mut set = greetings();
    add_row(&mut set, 1, "Goodbye");
    add_row(&mut set, 2, "Au revoir");

    set.set_capacity(64).unwrap();
    assert_eq!(set.capacity(), 64);
    assert_eq!(rows(&set), vec!["1|Goodbye", "2|Au revoir"]);

    let third = add_row(&mut set, 3, "Dag");
    assert_eq!(third.handle(), Some(2));
    assert_eq!(set.capacity(), 64);
}

#[test]
fn decreasing_capacity_compacts_trailing_rows() {
    let mut set = greetings();
    for (id, greeting) in [
        (1, "Goodbye"),
        (2, "Au revoir"),
        (3, "Auf Wiedersehen"),
        (4, "Dag"),
        (5, "Adios"),
    ] {
        add_row(&mut set, id, greeting);
    }
    assert_eq!(set.capacity(), 8);

    let fifth = find(&set, 5);
    let second = find(&set, 2);
    assert!(set.remove(&second));

    set.set_capacity(4).unwrap();
    assert_eq!(set.capacity(), 4);
    assert_eq!(
        rows(&set),
        vec!["1|Goodbye", "5|Adios", "3|Auf Wiedersehen", "4|Dag"]
    );
    // The moved record follows its row.
    assert_eq!(fifth.handle(), Some(1));
    assert_eq!(fifth.get_field::<i32>(&set, 0).unwrap(), 5);

    set.set_capacity(3).unwrap_err();
    assert_eq!(set.capacity(), 4);
}

#[test]
fn shrinking_after_removals_keeps_survivors() {
    let mut set = greetings();
    for (id, greeting) in [
        (1, "Goodbye"),
        (2, "Au revoir"),
        (3, "Auf Wiedersehen"),
        (4, "Dag"),
        (5, "Adios"),
    ] {
        add_row(&mut set, id, greeting);
    }
    for id in [2, 3, 5] {
        let record = find(&set, id);
        assert!(set.remove(&record));
    }

    set.set_capacity(2).unwrap();
    assert_eq!(set.capacity(), 2);
    assert_eq!(rows(&set), vec!["1|Goodbye", "4|Dag"]);

    // A full set grows again on the next add.
    add_row(&mut set, 6, "Ciao");
    assert_eq!(set.capacity(), 4);
    assert_eq!(rows(&set), vec!["1|Goodbye", "4|Dag", "6|Ciao"]);
}

#[test]
fn compact_densifies_without_releasing_capacity() {
    let mut set = greetings();
    for id in 1..=6 {
        add_row(&mut set, id, "Hi");
    }
    for id in [1, 3] {
        let record = find(&set, id);
        set.remove(&record);
    }
    set.compact().unwrap();

    let handles: Vec<_> = set.iter().map(|row| row.slot()).collect();
    assert_eq!(handles, vec![0, 1, 2, 3]);
    assert_eq!(set.capacity(), 8);
    let mut ids: Vec<i32> = set.iter().map(|row| row.get(0).unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![2, 4, 5, 6]);
}

#[test]
fn inserted_columns_shift_ordinals_and_read_defaults() {
    let mut set = greetings();
    let row = add_row(&mut set, 1, "Goodbye");
    let id = set.catalog().get(0).unwrap().clone();
    let greeting = set.catalog().get(1).unwrap().clone();

    let score = Column::new::<Option<f64>>("Score");
    let flag = Column::new::<bool>("Flag");
    set.insert_column(1, score.clone()).unwrap();
    set.insert_column(0, flag.clone()).unwrap();

    assert_eq!(flag.ordinal(), Some(0));
    assert_eq!(id.ordinal(), Some(1));
    assert_eq!(score.ordinal(), Some(2));
    assert_eq!(greeting.ordinal(), Some(3));

    assert!(!row.get_field::<bool>(&set, 0).unwrap());
    assert!(row.is_null(&set, 2).unwrap());
    assert_eq!(row.get_field::<Option<f64>>(&set, 2).unwrap(), None);
    assert_eq!(row.get_field_by_name::<i32>(&set, "Id").unwrap(), 1);
    assert_eq!(row.display(&set), "[false, 1, Null, Goodbye]");
    assert_eq!(row.field_count(&set).unwrap(), 4);
    assert!(row.field_type(&set, 2).unwrap().is::<Option<f64>>());
    assert_eq!(row.name(&set, 3).unwrap(), "Greeting");
    assert_eq!(row.ordinal(&set, "Score").unwrap(), 2);

    // Rows added afterwards get storage for every column.
    let next = add_row(&mut set, 2, "Dag");
    next.set_field_by_name(&mut set, "Score", 0.5).unwrap();
    assert_eq!(next.display(&set), "[false, 2, 0.5, Dag]");
}

#[test]
fn removed_columns_are_detached() {
    let mut set = greetings();
    let row = add_row(&mut set, 7, "Salut");
    set.insert_column(1, Column::new::<u8>("Level")).unwrap();

    let level = set.remove_column(1).unwrap();
    assert!(!level.is_attached());
    assert_eq!(level.ordinal(), None);
    assert_eq!(set.catalog().ordinal_of("Greeting"), Some(1));
    assert_eq!(row.get_field::<String>(&set, 1).unwrap(), "Salut");

    // A detached column can be attached again, with fresh storage.
    set.add_column(level.clone()).unwrap();
    assert_eq!(level.ordinal(), Some(2));
    assert_eq!(row.get_field::<u8>(&set, 2).unwrap(), 0);

    assert!(matches!(
        set.remove_column(9),
        Err(Error::InvalidArgumentError(_))
    ));
}

#[test]
fn replacing_and_clearing_columns() {
    let mut set = greetings();
    let row = add_row(&mut set, 1, "Goodbye");

    let old = set
        .replace_column(1, Column::new::<Option<String>>("Greeting"))
        .unwrap();
    assert!(!old.is_attached());
    assert!(row.is_null(&set, 1).unwrap());
    assert_eq!(row.display(&set), "[1, Null]");

    set.clear_columns();
    assert!(set.catalog().is_empty());
    assert_eq!(row.display(&set), "[]");
    assert!(set.contains(&row));
}

#[test]
fn column_contract_violations() {
    let mut set = greetings();

    assert!(matches!(
        set.add_column(Column::new::<u16>("Id")),
        Err(Error::InvalidArgumentError(_))
    ));

    let owned = set.catalog().get(0).unwrap().clone();
    assert!(matches!(
        set.add_column(owned.clone()),
        Err(Error::InvalidArgumentError(msg)) if msg.contains("this record set")
    ));
    let mut other = RecordSet::new();
    assert!(matches!(
        other.add_column(owned),
        Err(Error::InvalidArgumentError(msg)) if msg.contains("another record set")
    ));

    assert!(matches!(
        set.insert_column(5, Column::anonymous::<i32>()),
        Err(Error::InvalidArgumentError(_))
    ));
}

#[test]
fn record_contract_violations() {
    let mut set = greetings();
    let row = add_row(&mut set, 1, "Goodbye");

    assert!(matches!(
        set.add(&row),
        Err(Error::InvalidArgumentError(_))
    ));
    let mut other = greetings();
    assert!(matches!(
        other.add(&row),
        Err(Error::InvalidArgumentError(_))
    ));
    assert!(!other.remove(&row));

    assert!(matches!(
        row.get_field_by_name::<i32>(&set, "Missing"),
        Err(Error::KeyNotFound(_))
    ));
    assert!(matches!(
        row.get_field::<i32>(&other, 0),
        Err(Error::InvalidOperation(_))
    ));
    assert!(matches!(
        row.set_field(&mut set, 4, 1),
        Err(Error::InvalidArgumentError(_))
    ));
    assert!(matches!(
        row.set_field(&mut set, 0, "not a number".to_string()),
        Err(Error::InvalidCast(_))
    ));

    assert!(set.remove(&row));
    assert!(!set.remove(&row));
    assert!(matches!(
        row.get_field::<i32>(&set, 0),
        Err(Error::InvalidOperation(_))
    ));
    assert_eq!(row.display(&set), "");

    // A removed record can join another set.
    other.add(&row).unwrap();
    assert_eq!(row.get_field::<i32>(&other, 0).unwrap(), 0);
}

#[test]
fn capacity_below_count_is_rejected() {
    let mut set = greetings();
    for id in 0..3 {
        add_row(&mut set, id, "x");
    }
    assert!(matches!(
        set.set_capacity(2),
        Err(Error::InvalidOperation(_))
    ));
    assert_eq!(set.len(), 3);
}

#[test]
fn removed_slots_are_cleared() {
    let mut set = RecordSet::new();
    set.add_column(Column::new::<Option<String>>("Note")).unwrap();
    let row = set.add_new().unwrap();
    row.set_field(&mut set, 0, "remember me".to_string()).unwrap();
    let slot = row.handle().unwrap();

    set.remove(&row);
    assert!(set.column_data(0).unwrap().is_null(slot).unwrap());

    let reused = set.add_new().unwrap();
    assert_eq!(reused.handle(), Some(slot));
    assert!(reused.is_null(&set, 0).unwrap());
}

type Changes = Arc<Mutex<Vec<String>>>;

fn watch(set: &RecordSet) -> (Changes, photon_column::ObserverId) {
    let log: Changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let id = set.subscribe(Arc::new(move |change: &RecordChange<'_>| {
        let id = change
            .records
            .get_field::<i32>(change.record, 0)
            .unwrap_or_default();
        sink.lock().unwrap().push(format!(
            "{}: {}|{} - {}|{}",
            change.ordinal, id, change.old, id, change.new
        ));
    }));
    (log, id)
}

#[test]
fn field_changes_reach_record_observers() {
    let mut set = greetings();
    let row = add_row(&mut set, 1, "Goodbye");
    let (log, id) = watch(&set);

    assert!(row
        .set_field_by_name(&mut set, "Greeting", "Au revoir".to_string())
        .unwrap());
    // Equal values do not notify.
    assert!(!row
        .set_field_by_name(&mut set, "Greeting", "Au revoir".to_string())
        .unwrap());

    assert_eq!(
        *log.lock().unwrap(),
        vec!["1: 1|Goodbye - 1|Au revoir".to_string()]
    );

    assert!(set.unsubscribe(id));
    row.set_field(&mut set, 1, "Dag".to_string()).unwrap();
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn record_changes_carry_current_ordinals() {
    let mut set = greetings();
    let row = add_row(&mut set, 1, "Goodbye");
    set.insert_column(0, Column::new::<Option<i64>>("Rank")).unwrap();

    let seen: Arc<Mutex<Vec<(usize, AnyValue, AnyValue)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    set.subscribe(Arc::new(move |change: &RecordChange<'_>| {
        sink.lock()
            .unwrap()
            .push((change.ordinal, change.old.clone(), change.new.clone()));
    }));

    row.set_field_by_name(&mut set, "Greeting", "Hej".to_string())
        .unwrap();
    row.set_field(&mut set, 0, 3u8).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, 2);
    assert_eq!(seen[0].2, AnyValue::new("Hej".to_string()));
    assert_eq!(seen[1].0, 0);
    assert!(seen[1].1.is_null());
    assert_eq!(seen[1].2, AnyValue::new(3i64));
}

#[test]
fn collection_observers_see_structural_changes() {
    let mut set = greetings();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    set.subscribe_collection(Arc::new(
        move |records: &RecordSet, change: &CollectionChange| {
            sink.lock().unwrap().push((records.len(), change.clone()));
        },
    ));

    let first = set.add_new().unwrap();
    let second = set.add_new().unwrap();
    set.remove(&first);
    set.clear().unwrap();

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            (
                1,
                CollectionChange::Added {
                    record: first.clone(),
                    slot: 0
                }
            ),
            (
                2,
                CollectionChange::Added {
                    record: second.clone(),
                    slot: 1
                }
            ),
            (
                1,
                CollectionChange::Removed {
                    record: first.clone(),
                    slot: 0
                }
            ),
            (0, CollectionChange::Reset),
        ]
    );
    assert!(!second.is_attached());
    assert_eq!(set.capacity(), 0);
}

#[test]
fn cursors_detect_structural_modification() {
    let mut set = greetings();
    add_row(&mut set, 1, "Goodbye");
    let second = add_row(&mut set, 2, "Au revoir");
    add_row(&mut set, 3, "Auf Wiedersehen");

    let mut cursor = set.cursor();
    let first = cursor.next_record(&set).unwrap().unwrap();
    assert_eq!(first.get_field::<i32>(&set, 0).unwrap(), 1);

    // Field writes are not structural.
    first.set_field(&mut set, 1, "Tot ziens".to_string()).unwrap();
    assert_eq!(cursor.next_record(&set).unwrap(), Some(second.clone()));

    set.remove(&second);
    assert!(matches!(
        cursor.next_record(&set),
        Err(Error::ConcurrentModification)
    ));

    let mut fresh = set.cursor();
    let mut seen = Vec::new();
    while let Some(record) = fresh.next_record(&set).unwrap() {
        seen.push(record.get_field::<i32>(&set, 0).unwrap());
    }
    assert_eq!(seen, vec![1, 3]);

    let other = RecordSet::new();
    assert!(matches!(
        fresh.next_record(&other),
        Err(Error::InvalidArgumentError(_))
    ));
}

#[test]
fn initial_capacity_and_growth_floor_come_from_config() {
    let mut set = RecordSet::with_config(RecordSetConfig {
        initial_capacity: 2,
        min_growth: 16,
    });
    set.add_column(Column::new::<i32>("Id")).unwrap();
    assert_eq!(set.capacity(), 2);
    set.add_new().unwrap();
    set.add_new().unwrap();
    assert_eq!(set.capacity(), 2);
    set.add_new().unwrap();
    assert_eq!(set.capacity(), 16);
}

#[test]
fn randomized_operations_match_model() {
    init_tracing_for_tests();

    let mut rng = StdRng::seed_from_u64(0x5eed_cafe);
    let mut set = RecordSet::new();
    set.add_columns([
        Column::new::<i64>("Id"),
        Column::new::<Option<String>>("Label"),
    ])
    .unwrap();
    let mut model: Vec<(Record, i64)> = Vec::new();
    let mut next_id = 0i64;

    for _ in 0..2_000 {
        match rng.random_range(0..10) {
            0..=4 => {
                let record = set.add_new().unwrap();
                record.set_field(&mut set, 0, next_id).unwrap();
                if next_id % 3 == 0 {
                    record.set_field(&mut set, 1, format!("#{next_id}")).unwrap();
                }
                model.push((record, next_id));
                next_id += 1;
            }
            5..=7 if !model.is_empty() => {
                let index = rng.random_range(0..model.len());
                let (record, _) = model.swap_remove(index);
                assert!(set.remove(&record));
            }
            8 => set.compact().unwrap(),
            9 => {
                let capacity = set.len() + rng.random_range(0..4);
                set.set_capacity(capacity).unwrap();
                assert_eq!(set.capacity(), capacity);
            }
            _ => {}
        }

        assert_eq!(set.len(), model.len());
        assert!(set.capacity() >= set.len());
    }

    for (record, id) in &model {
        assert!(set.contains(record));
        assert_eq!(record.get_field::<i64>(&set, 0).unwrap(), *id);
        let label: Option<String> = record.get_field(&set, 1).unwrap();
        assert_eq!(label, (id % 3 == 0).then(|| format!("#{id}")));
    }
    assert_eq!(set.iter().count(), model.len());
}

#[test]
fn dropping_a_set_detaches_its_records_and_columns() {
    let mut first = greetings();
    let row = add_row(&mut first, 1, "Goodbye");
    let id = first.catalog().get(0).unwrap().clone();
    drop(first);

    assert!(!row.is_attached());
    assert_eq!(row.handle(), None);
    assert!(!id.is_attached());
    assert_eq!(id.ordinal(), None);

    let mut second = RecordSet::new();
    second.add_column(id.clone()).unwrap();
    second.add(&row).unwrap();
    assert_eq!(id.ordinal(), Some(0));
    assert_eq!(row.get_field::<i32>(&second, 0).unwrap(), 0);
}

#[test]
fn replacing_a_column_with_itself_keeps_its_values() {
    let mut set = greetings();
    let row = add_row(&mut set, 1, "Goodbye");
    let greeting = set.catalog().get(1).unwrap().clone();

    let returned = set.replace_column(1, greeting.clone()).unwrap();
    assert_eq!(returned, greeting);
    assert!(greeting.is_attached());
    assert_eq!(greeting.ordinal(), Some(1));
    assert_eq!(row.display(&set), "[1, Goodbye]");
}

fn plain_strings() -> Box<dyn ColumnData> {
    Box::new(PlainColumnData::<String>::new())
}

fn nullable_ints() -> Box<dyn ColumnData> {
    Box::new(NullableColumnData::<i32>::new())
}

#[test]
fn factory_storage_must_match_the_declared_type() {
    let mut factory = ColumnDataFactory::new();
    factory.register::<i32>(plain_strings);
    let mut set = RecordSet::new().with_factory(Arc::new(factory));

    let id = Column::new::<i32>("Id");
    assert!(matches!(
        set.add_column(id.clone()),
        Err(Error::InvalidArgumentError(msg)) if msg.contains("'Id'")
    ));
    assert!(!id.is_attached());
    assert!(set.catalog().is_empty());

    // The nullable variant of the declared type is accepted.
    let mut factory = ColumnDataFactory::new();
    factory.register::<i32>(nullable_ints);
    let mut set = RecordSet::new().with_factory(Arc::new(factory));
    set.add_column(Column::new::<i32>("Id")).unwrap();
    let row = set.add_new().unwrap();
    assert!(row.is_null(&set, 0).unwrap());
    row.set_field(&mut set, 0, "7".to_string()).unwrap();
    assert_eq!(row.get_field::<i32>(&set, 0).unwrap(), 7);
    assert!(matches!(
        row.set_field(&mut set, 0, "abc".to_string()),
        Err(Error::InvalidCast(_))
    ));
}

#[test]
fn record_sets_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RecordSet>();
    assert_send_sync::<Record>();
    assert_send_sync::<Column>();
}
