use docsnap::common::{Convertible, Timestamp, Value, CREATE_TIME, UPDATE_TIME};
use docsnap::doc;
use docsnap::document::{CollectionGroup, CollectionPath, Document, DocumentPath};
use docsnap::errors::ErrorKind;
use docsnap::snapshot::Snapshot;
use docsnap::store::Store;
use docsnap_derive::{Convertible, FieldNames, SnapshotData};
use docsnap_int_test::test_util::{cleanup, create_test_context, run_test};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[derive(Debug, Clone, PartialEq, Default, Convertible)]
enum Plan {
    #[default]
    Free,
    Trial(i64),
    Paid { seats: i64, yearly: bool },
}

#[derive(Debug, Clone, PartialEq, Default, Convertible, SnapshotData, FieldNames)]
#[snapshot(timestamps)]
struct Account {
    id: String,
    owner: String,
    plan: Plan,
    labels: Vec<String>,
    note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Convertible, SnapshotData, FieldNames)]
struct Member {
    name: String,
}

fn accounts() -> CollectionPath<Account> {
    CollectionPath::new("accounts")
}

fn account(owner: &str) -> Account {
    Account {
        id: String::new(),
        owner: owner.to_string(),
        plan: Plan::Paid {
            seats: 3,
            yearly: true,
        },
        labels: vec!["vip".to_string()],
        note: None,
    }
}

#[test]
fn test_create_then_read_populates_timestamps() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let snapshot = Snapshot::new_in(&store, &accounts(), Some("a"), account("alice"));
            snapshot.create(false)?;
            // only known after a read
            assert_eq!(snapshot.create_time(), None);

            let read = Snapshot::get(&store, snapshot.path())?;
            assert_eq!(read.create_time(), Some(ctx.now()));
            assert_eq!(read.update_time(), Some(ctx.now()));
            assert_eq!(read.data(), snapshot.data());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_moves_update_time_only() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let created_at = ctx.now();
            Snapshot::new_in(&store, &accounts(), Some("a"), account("alice")).create(false)?;

            ctx.advance_clock(30);
            let mut snapshot = Snapshot::get(&store, &accounts().document("a"))?;
            snapshot.note = Some("renewed".to_string());
            snapshot.update()?;

            let read = Snapshot::get(&store, &accounts().document("a"))?;
            assert_eq!(read.create_time(), Some(created_at));
            assert_eq!(read.update_time(), Some(ctx.now()));
            assert_eq!(read.update_time().and_then(|t| t.to_datetime()), ctx.now_utc());
            assert_eq!(read.note.as_deref(), Some("renewed"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_round_trip_of_written_fields() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let snapshot = Snapshot::new_in(&store, &accounts(), Some("a"), account("alice"));

            let mut fields = snapshot.extract_fields_for_create()?;
            for key in [CREATE_TIME, UPDATE_TIME] {
                fields.put(key, Value::Timestamp(Timestamp::from_seconds(1)))?;
            }
            let decoded = Account::from_value(&Value::Document(fields))?;
            assert_eq!(&decoded, snapshot.data());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_enum_encoding() {
    let paid = Plan::Paid {
        seats: 2,
        yearly: false,
    }
    .to_value()
    .unwrap();
    assert_eq!(
        paid,
        Value::Document(doc! {
            variant: "Paid",
            value: { seats: 2, yearly: false },
        })
    );

    let trial = Plan::Trial(14).to_value().unwrap();
    assert_eq!(trial, Value::Document(doc! { variant: "Trial", value: [14] }));
    assert_eq!(Plan::from_value(&trial).unwrap(), Plan::Trial(14));
    assert_eq!(Plan::from_value(&Plan::Free.to_value().unwrap()).unwrap(), Plan::Free);

    let unknown = Value::Document(doc! { variant: "Enterprise", value: (Value::Null) });
    let err = Plan::from_value(&unknown).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::DecodingError);
}

#[test]
fn test_missing_document_is_not_exists() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let err = Snapshot::get(&store, &accounts().document("nobody")).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotExists);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_of_missing_document_is_not_found() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let snapshot = Snapshot::new_in(&store, &accounts(), Some("ghost"), account("ghost"));
            let err = snapshot.update().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_lifecycle_ends_with_delete() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let mut snapshot = Snapshot::new_in(&store, &accounts(), None, account("alice"));
            snapshot.create(false)?;
            snapshot.labels.push("beta".to_string());
            snapshot.update()?;
            snapshot.delete()?;

            assert_eq!(snapshot.labels.len(), 2);
            let err = Snapshot::get(&store, snapshot.path()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotExists);
            assert_eq!(snapshot.update().unwrap_err().kind(), &ErrorKind::NotFound);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_merge_keeps_unknown_fields() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let raw: DocumentPath<Document> = DocumentPath::new("accounts/a");
            Snapshot::new(&store, raw.clone(), doc! { legacy: true }).create(false)?;

            Snapshot::new(&store, raw.cast::<Account>(), account("alice")).merge()?;
            let merged = Snapshot::get(&store, &raw)?;
            assert_eq!(merged.data().get("legacy"), Some(&Value::Bool(true)));
            assert_eq!(merged.data().get("owner"), Some(&Value::from("alice")));

            Snapshot::new(&store, raw.cast::<Account>(), account("bob")).create(false)?;
            let replaced = Snapshot::get(&store, &raw)?;
            assert!(!replaced.data().contains_key("legacy"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_generated_ids() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let first = Snapshot::new_in(&store, &accounts(), None, account("a"));
            let second = Snapshot::new_in(&store, &accounts(), Some(""), account("b"));
            assert_eq!(first.id().len(), 20);
            assert!(first.id().chars().all(|c| c.is_ascii_alphanumeric()));
            assert_ne!(first.id(), second.id());

            let short = Store::builder().auto_id_length(6).build()?;
            let third = Snapshot::new_in(&short, &accounts(), None, account("c"));
            assert_eq!(third.id().len(), 6);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_factory_embeds_id() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let snapshot = Snapshot::with_factory_in(&store, &accounts(), None, |path| Account {
                id: path.id().to_string(),
                ..account("alice")
            });
            snapshot.create(false)?;

            let read = Snapshot::get(&store, snapshot.path())?;
            assert_eq!(read.id, snapshot.id());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_replicate() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            Snapshot::new_in(&store, &accounts(), Some("a"), account("alice")).create(false)?;
            let original = Snapshot::get(&store, &accounts().document("a"))?;

            let mut in_place = original.replicate(None);
            in_place.owner = "carol".to_string();
            assert_eq!(original.owner, "alice");
            assert_eq!(in_place.create_time(), original.create_time());

            let moved = original.replicate(Some(accounts().document("b")));
            assert_eq!(moved.create_time(), None);
            moved.create(false)?;

            let all = Snapshot::get_all(&store, &accounts(), |_| {})?;
            assert_eq!(all.len(), 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_paths_fail_on_use() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let bad_document = Snapshot::new(&store, DocumentPath::new("accounts"), account("a"));
            assert_eq!(bad_document.create(false).unwrap_err().kind(), &ErrorKind::InvalidPath);

            let slashes: DocumentPath<Account> = DocumentPath::new("/accounts/a");
            assert!(!slashes.is_valid());
            assert_eq!(Snapshot::get(&store, &slashes).unwrap_err().kind(), &ErrorKind::InvalidPath);

            let bad_collection: CollectionPath<Account> = CollectionPath::new("accounts/a");
            let err = Snapshot::get_all(&store, &bad_collection, |_| {}).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidPath);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sub_collections_and_groups() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            for owner in ["a", "b"] {
                let parent = accounts().document(owner);
                Snapshot::new(&store, parent.clone(), account(owner)).create(false)?;
                let members = parent.collection::<Member>("members");
                for name in ["x", "y"] {
                    let member = Member {
                        name: format!("{}-{}", owner, name),
                    };
                    Snapshot::new_in(&store, &members, Some(name), member).create(false)?;
                }
            }

            let of_a = Snapshot::get_all(&store, &accounts().document("a").collection::<Member>("members"), |_| {})?;
            assert_eq!(of_a.len(), 2);
            assert_eq!(of_a[0].path().parent().parent::<Account>(), Some(accounts().document("a")));

            let everyone = Snapshot::get_group(&store, &CollectionGroup::<Member>::new("members"), |q| {
                q.order_by(MemberField::Name, true);
            })?;
            let names: Vec<&str> = everyone.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(names, vec!["b-y", "b-x", "a-y", "a-x"]);
            Ok(())
        },
        cleanup,
    )
}
