use lendtrack_core::db::open_db;
use lendtrack_core::{
    Contact, ContactRegistry, FileBlobStore, Item, ItemRegistry, LendingCommand, LendingService,
    SqliteBlobStore, StatusChange, StoragePort, CONTACTS_BLOB_KEY, ITEMS_BLOB_KEY,
};

#[test]
fn save_all_of_load_all_preserves_logical_content() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("lend.db")).unwrap();
    let contact_store = SqliteBlobStore::new(&conn, CONTACTS_BLOB_KEY);
    let item_store = SqliteBlobStore::new(&conn, ITEMS_BLOB_KEY);

    let mut contacts = ContactRegistry::new(&contact_store);
    contacts.add(Contact::with_id("bob", "bob@x.com", Some("7".to_string())).unwrap());
    contacts.add(Contact::new("amy", "amy@x.com").unwrap());
    contacts.flush().unwrap();

    let mut items = ItemRegistry::new(&item_store);
    items.add(Item::new("Drill", "cordless").unwrap());
    items.add(Item::new("Saw", "").unwrap());
    items.set_status(
        1,
        StatusChange::Borrowed {
            borrower: "amy".to_string(),
        },
        &contacts,
    );
    items.flush().unwrap();

    let contacts_before = contacts.load_all().unwrap();
    let items_before = items.load_all().unwrap();
    contacts.save_all(&contacts_before).unwrap();
    items.save_all(&items_before).unwrap();

    assert_eq!(contacts.load_all().unwrap(), contacts_before);
    assert_eq!(items.load_all().unwrap(), items_before);
}

#[test]
fn persisted_records_use_expected_wire_fields() {
    let dir = tempfile::tempdir().unwrap();
    let contact_store = FileBlobStore::new(dir.path().join("contacts.json"));
    let item_store = FileBlobStore::new(dir.path().join("items.json"));
    let mut service = LendingService::new(contact_store.clone(), item_store.clone());

    service
        .handle(LendingCommand::AddContact {
            username: "bob".to_string(),
            email: "bob@x.com".to_string(),
        })
        .unwrap();
    service
        .handle(LendingCommand::AddItem {
            title: "Drill".to_string(),
            description: "cordless".to_string(),
        })
        .unwrap();
    service
        .handle(LendingCommand::LendItem {
            item: lendtrack_core::ItemRef::Position(0),
            borrower: "bob".to_string(),
        })
        .unwrap();

    let contacts: serde_json::Value =
        serde_json::from_str(&contact_store.load().unwrap().unwrap()).unwrap();
    assert_eq!(
        contacts,
        serde_json::json!([{"username": "bob", "email": "bob@x.com", "id": null}])
    );

    let items: serde_json::Value =
        serde_json::from_str(&item_store.load().unwrap().unwrap()).unwrap();
    let drill = &items[0];
    assert_eq!(drill["title"], "Drill");
    assert_eq!(drill["description"], "cordless");
    assert_eq!(drill["status"], "Borrowed");
    assert_eq!(drill["borrower"]["username"], "bob");
    assert_eq!(drill["borrower"]["email"], "bob@x.com");
    assert!(drill["id"].is_string());
}

#[test]
fn sqlite_registries_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lend.db");

    {
        let conn = open_db(&path).unwrap();
        let mut service = LendingService::new(
            SqliteBlobStore::new(&conn, CONTACTS_BLOB_KEY),
            SqliteBlobStore::new(&conn, ITEMS_BLOB_KEY),
        );
        service
            .handle(LendingCommand::AddContact {
                username: "bob".to_string(),
                email: "bob@x.com".to_string(),
            })
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let service = LendingService::open(
        SqliteBlobStore::new(&conn, CONTACTS_BLOB_KEY),
        SqliteBlobStore::new(&conn, ITEMS_BLOB_KEY),
    )
    .unwrap();
    assert_eq!(service.contacts().len(), 1);
    assert!(service.items().is_empty());
}

#[test]
fn corrupt_file_blob_starts_empty_and_is_overwritten_on_flush() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.json");
    std::fs::write(&path, "{{{ definitely not json").unwrap();

    let mut contacts = ContactRegistry::new(FileBlobStore::new(&path));
    assert_eq!(contacts.reload().unwrap(), 0);

    contacts.add(Contact::new("bob", "bob@x.com").unwrap());
    contacts.flush().unwrap();

    let mut reopened = ContactRegistry::new(FileBlobStore::new(&path));
    assert_eq!(reopened.reload().unwrap(), 1);
}
