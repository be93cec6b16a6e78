mod support;

use repoproxy::{Repository, Value};
use support::{FakeSource, field_of};

#[test]
fn known_attributes_read_and_write_directly() {
    let mut repo = Repository::new(FakeSource::query().shared());

    assert_eq!(repo.field("per_page").unwrap(), Some(Value::Integer(10)));
    assert_eq!(repo.field("current_page").unwrap(), Some(Value::Integer(1)));
    assert_eq!(
        repo.field("page_name").unwrap(),
        Some(Value::Text("page".into()))
    );

    repo.set_field("per_page", Value::Integer(50)).unwrap();
    repo.set_field("page_name", Value::Text("p".into())).unwrap();
    assert_eq!(repo.per_page(), 50);
    assert_eq!(repo.page_name(), "p");
}

#[test]
fn field_read_scans_the_resolver_history_in_insertion_order() {
    let first = FakeSource::record(&[("name", Value::Text("early".into()))]).shared();
    let second = FakeSource::record(&[
        ("name", Value::Text("late".into())),
        ("age", Value::Integer(30)),
    ])
    .shared();

    let base = FakeSource::query()
        .advances_to("first_op", first)
        .shared();

    let mut repo = Repository::new(base);
    repo.call("first_op").unwrap();
    repo.set_entity(repoproxy::Entity::Source(second.clone()));

    // "name" exists on the earlier history entry; insertion order wins.
    assert_eq!(
        repo.field("name").unwrap(),
        Some(Value::Text("early".into()))
    );
    // "age" exists nowhere in history (second never advanced the chain).
    assert_eq!(repo.field("age").unwrap(), None);
}

#[test]
fn field_read_miss_is_absence_not_an_error() {
    let repo = Repository::new(
        FakeSource::record(&[("id", Value::Integer(1))]).shared(),
    );

    assert_eq!(repo.field("nonexistent").unwrap(), None);
    assert!(!repo.has_field("nonexistent").unwrap());
    assert!(repo.has_field("id").unwrap());
}

#[test]
fn field_write_broadcasts_over_collection_entries() {
    let with_flag_a = FakeSource::record(&[
        ("id", Value::Integer(1)),
        ("flag", Value::Boolean(false)),
    ])
    .shared();
    let with_flag_b = FakeSource::record(&[
        ("id", Value::Integer(2)),
        ("flag", Value::Boolean(false)),
    ])
    .shared();
    let without_flag = FakeSource::record(&[("id", Value::Integer(3))]).shared();

    let collection = FakeSource::collection(vec![
        with_flag_a.clone(),
        with_flag_b.clone(),
        without_flag.clone(),
    ])
    .shared();

    let base = FakeSource::query().advances_to("get", collection).shared();
    let mut repo = Repository::new(base);
    repo.call("get").unwrap();

    // Broadcast to every element exposing the key; the rest are skipped
    // silently, never an error.
    repo.set_field("flag", Value::Boolean(true)).unwrap();

    assert_eq!(field_of(&with_flag_a, "flag"), Some(Value::Boolean(true)));
    assert_eq!(field_of(&with_flag_b, "flag"), Some(Value::Boolean(true)));
    assert_eq!(field_of(&without_flag, "flag"), None);
}

#[test]
fn field_write_reaches_record_entries_directly() {
    let record = FakeSource::record(&[("status", Value::Text("new".into()))]).shared();
    let base = FakeSource::query()
        .advances_to("first", record.clone())
        .shared();

    let mut repo = Repository::new(base);
    repo.call("first").unwrap();

    repo.set_field("status", Value::Text("seen".into())).unwrap();
    assert_eq!(field_of(&record, "status"), Some(Value::Text("seen".into())));
}

#[test]
fn unset_field_removes_from_the_current_entity() {
    let record = FakeSource::record(&[("tmp", Value::Integer(1))]).shared();
    let mut repo = Repository::new(record.clone());

    repo.unset_field("tmp").unwrap();
    assert_eq!(field_of(&record, "tmp"), None);
}
