use lendtrack_core::{
    CommandOutcome, ContactValidationError, ItemRef, ItemStatus, ItemValidationError,
    LendingCommand, LendingError, LendingService, MemoryBlobStore, StorageError, StoragePort,
    StorageResult,
};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

type Service = LendingService<MemoryBlobStore, MemoryBlobStore>;

fn service() -> (Service, MemoryBlobStore, MemoryBlobStore) {
    let contact_store = MemoryBlobStore::new();
    let item_store = MemoryBlobStore::new();
    let service = LendingService::new(contact_store.clone(), item_store.clone());
    (service, contact_store, item_store)
}

fn add_contact(service: &mut Service, username: &str, email: &str) {
    service
        .handle(LendingCommand::AddContact {
            username: username.to_string(),
            email: email.to_string(),
        })
        .unwrap();
}

fn add_item(service: &mut Service, title: &str) {
    service
        .handle(LendingCommand::AddItem {
            title: title.to_string(),
            description: String::new(),
        })
        .unwrap();
}

fn lend(service: &mut Service, position: usize, borrower: &str) -> Result<CommandOutcome, LendingError> {
    service.handle(LendingCommand::LendItem {
        item: ItemRef::Position(position),
        borrower: borrower.to_string(),
    })
}

#[test]
fn add_contact_rejects_duplicates_and_blank_input() {
    let (mut service, _, _) = service();
    add_contact(&mut service, "bob", "bob@x.com");

    let err = service
        .handle(LendingCommand::AddContact {
            username: "Bob".to_string(),
            email: "bob2@x.com".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, LendingError::UsernameTaken(ref name) if name == "Bob"));

    let err = service
        .handle(LendingCommand::AddContact {
            username: "  ".to_string(),
            email: "x@x.com".to_string(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        LendingError::InvalidContact(ContactValidationError::EmptyUsername)
    ));

    assert_eq!(service.contacts().len(), 1);
    assert_eq!(service.contacts().get("bob").unwrap().email(), "bob@x.com");
}

#[test]
fn mutations_are_flushed_immediately() {
    let (mut service, contact_store, item_store) = service();
    add_contact(&mut service, "bob", "bob@x.com");
    add_item(&mut service, "Drill");
    lend(&mut service, 0, "bob").unwrap();

    let reopened = LendingService::open(contact_store, item_store).unwrap();
    assert_eq!(reopened.contacts().contacts(), service.contacts().contacts());
    assert_eq!(reopened.items().items(), service.items().items());
    assert_eq!(
        reopened.items().get(0).unwrap().status(),
        ItemStatus::Borrowed
    );
}

#[test]
fn remove_contact_is_blocked_for_active_borrower() {
    let (mut service, contact_store, _) = service();
    add_contact(&mut service, "bob", "bob@x.com");
    add_item(&mut service, "Drill");
    lend(&mut service, 0, "bob").unwrap();
    let persisted_before = contact_store.contents();

    let allowed = service
        .handle(LendingCommand::CanRemoveContact {
            username: "BOB".to_string(),
        })
        .unwrap();
    assert_eq!(allowed, CommandOutcome::RemovalAllowed(false));

    let err = service
        .handle(LendingCommand::RemoveContact {
            username: "bob".to_string(),
        })
        .unwrap_err();
    match err {
        LendingError::ActiveBorrower(blocked) => {
            assert_eq!(blocked.item_titles, vec!["Drill".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.contacts().len(), 1);
    assert_eq!(contact_store.contents(), persisted_before);

    service
        .handle(LendingCommand::ReturnItem {
            item: ItemRef::Position(0),
        })
        .unwrap();
    let removed = service
        .handle(LendingCommand::RemoveContact {
            username: "bob".to_string(),
        })
        .unwrap();
    assert!(matches!(removed, CommandOutcome::ContactRemoved(ref c) if c.username() == "bob"));
    assert!(service.contacts().is_empty());
}

#[test]
fn lend_reports_missing_borrower_and_missing_item() {
    let (mut service, _, _) = service();
    add_contact(&mut service, "bob", "bob@x.com");
    add_item(&mut service, "Drill");

    let err = lend(&mut service, 0, "zed").unwrap_err();
    assert!(matches!(err, LendingError::BorrowerNotFound(ref name) if name == "zed"));

    let err = lend(&mut service, 5, "bob").unwrap_err();
    assert!(matches!(err, LendingError::ItemNotFound(ItemRef::Position(5))));

    let err = lend(&mut service, 0, " ").unwrap_err();
    assert!(matches!(err, LendingError::InvalidContact(_)));

    assert!(service.items().get(0).unwrap().is_available());
}

#[test]
fn update_email_requires_at_sign_and_refreshes_borrower_copies() {
    let (mut service, _, _) = service();
    add_contact(&mut service, "bob", "bob@x.com");
    add_item(&mut service, "Drill");
    lend(&mut service, 0, "bob").unwrap();

    let err = service
        .handle(LendingCommand::UpdateContactEmail {
            username: "bob".to_string(),
            email: "bob.at.x.com".to_string(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        LendingError::InvalidContact(ContactValidationError::MalformedEmail(_))
    ));

    let err = service
        .handle(LendingCommand::UpdateContactEmail {
            username: "amy".to_string(),
            email: "amy@x.com".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, LendingError::ContactNotFound(_)));

    service
        .handle(LendingCommand::UpdateContactEmail {
            username: "BOB".to_string(),
            email: "bob@new.com".to_string(),
        })
        .unwrap();
    assert_eq!(service.contacts().get("bob").unwrap().email(), "bob@new.com");
    assert_eq!(
        service.items().get(0).unwrap().borrower().unwrap().email(),
        "bob@new.com"
    );
}

#[test]
fn items_are_addressable_by_handle() {
    let (mut service, _, _) = service();
    add_contact(&mut service, "amy", "amy@x.com");
    add_item(&mut service, "Drill");
    add_item(&mut service, "Saw");
    let saw_id = service.items().get(1).unwrap().id();

    service
        .handle(LendingCommand::RemoveItem {
            item: ItemRef::Position(0),
        })
        .unwrap();
    let outcome = service
        .handle(LendingCommand::LendItem {
            item: ItemRef::Id(saw_id),
            borrower: "amy".to_string(),
        })
        .unwrap();
    match outcome {
        CommandOutcome::Item(item) => {
            assert_eq!(item.title(), "Saw");
            assert_eq!(item.borrower().unwrap().username(), "amy");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn update_item_validates_title_before_mutation() {
    let (mut service, _, _) = service();
    add_item(&mut service, "Drill");

    let err = service
        .handle(LendingCommand::UpdateItem {
            item: ItemRef::Position(0),
            title: " ".to_string(),
            description: "x".to_string(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        LendingError::InvalidItem(ItemValidationError::EmptyTitle)
    ));

    let outcome = service
        .handle(LendingCommand::UpdateItem {
            item: ItemRef::Position(0),
            title: "Impact drill".to_string(),
            description: "18V".to_string(),
        })
        .unwrap();
    match outcome {
        CommandOutcome::Item(item) => {
            assert_eq!(item.title(), "Impact drill");
            assert_eq!(item.description(), "18V");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn reload_picks_up_external_changes() {
    let contact_store = MemoryBlobStore::with_contents(
        r#"[{"username": "bob", "email": "bob@x.com", "id": null}]"#,
    );
    let item_store = MemoryBlobStore::with_contents("not json");
    let mut service = LendingService::new(contact_store, item_store);
    assert!(service.contacts().is_empty());

    let outcome = service.handle(LendingCommand::Reload).unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::Reloaded {
            contacts: 1,
            items: 0
        }
    );

    let listed = service.handle(LendingCommand::ListContacts).unwrap();
    match listed {
        CommandOutcome::Contacts(contacts) => assert_eq!(contacts.len(), 1),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

/// Memory store whose saves can be switched to fail.
#[derive(Clone, Default)]
struct SwitchableStore {
    inner: MemoryBlobStore,
    failing: Rc<Cell<bool>>,
}

impl SwitchableStore {
    fn fail_saves(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl StoragePort for SwitchableStore {
    fn load(&self) -> StorageResult<Option<String>> {
        self.inner.load()
    }

    fn save(&self, raw: &str) -> StorageResult<()> {
        if self.failing.get() {
            return Err(StorageError::Io {
                path: PathBuf::from("registry.json"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.save(raw)
    }
}

#[test]
fn failed_save_leaves_registries_unchanged() {
    let contact_store = SwitchableStore::default();
    let item_store = SwitchableStore::default();
    let mut service = LendingService::new(contact_store.clone(), item_store.clone());
    service
        .handle(LendingCommand::AddContact {
            username: "amy".to_string(),
            email: "amy@x.com".to_string(),
        })
        .unwrap();
    service
        .handle(LendingCommand::AddItem {
            title: "Drill".to_string(),
            description: String::new(),
        })
        .unwrap();

    contact_store.fail_saves(true);
    let add_bob = LendingCommand::AddContact {
        username: "bob".to_string(),
        email: "bob@x.com".to_string(),
    };
    let err = service.handle(add_bob.clone()).unwrap_err();
    assert!(matches!(err, LendingError::Storage(_)));
    assert_eq!(service.contacts().len(), 1);
    assert!(service.contacts().get("bob").is_none());

    let err = service
        .handle(LendingCommand::RemoveContact {
            username: "amy".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, LendingError::Storage(_)));
    assert!(service.contacts().get("amy").is_some());

    item_store.fail_saves(true);
    let err = service
        .handle(LendingCommand::LendItem {
            item: ItemRef::Position(0),
            borrower: "amy".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, LendingError::Storage(_)));
    assert!(service.items().get(0).unwrap().is_available());

    let err = service
        .handle(LendingCommand::RemoveItem {
            item: ItemRef::Position(0),
        })
        .unwrap_err();
    assert!(matches!(err, LendingError::Storage(_)));
    assert_eq!(service.items().len(), 1);

    contact_store.fail_saves(false);
    item_store.fail_saves(false);
    service.handle(add_bob).unwrap();
    assert_eq!(service.contacts().len(), 2);
}

#[test]
fn failed_item_save_during_email_edit_keeps_both_blobs_in_step() {
    let contact_store = SwitchableStore::default();
    let item_store = SwitchableStore::default();
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
            description: String::new(),
        })
        .unwrap();
    service
        .handle(LendingCommand::LendItem {
            item: ItemRef::Position(0),
            borrower: "bob".to_string(),
        })
        .unwrap();

    item_store.fail_saves(true);
    let err = service
        .handle(LendingCommand::UpdateContactEmail {
            username: "bob".to_string(),
            email: "bob@new.com".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, LendingError::Storage(_)));
    assert_eq!(service.contacts().get("bob").unwrap().email(), "bob@x.com");
    assert_eq!(
        service.items().get(0).unwrap().borrower().unwrap().email(),
        "bob@x.com"
    );

    item_store.fail_saves(false);
    let reopened = LendingService::open(contact_store, item_store).unwrap();
    assert_eq!(reopened.contacts().get("bob").unwrap().email(), "bob@x.com");
    assert_eq!(
        reopened.items().get(0).unwrap().borrower().unwrap().email(),
        "bob@x.com"
    );
}
