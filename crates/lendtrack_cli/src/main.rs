//! CLI entry point over the lending core.
//!
//! # Responsibility
//! - Run one `LendingCommand` against the SQLite-backed registries.
//! - Keep output line-oriented and deterministic for scripting.
//!
//! Storage and logging come from `LENDTRACK_DB_PATH`, `LENDTRACK_LOG_LEVEL`
//! and `LENDTRACK_LOG_DIR`.

use clap::{Parser, Subcommand};
use lendtrack_core::db::open_db;
use lendtrack_core::{
    init_logging_from_config, CommandOutcome, Contact, Item, ItemId, ItemRef, LendingCommand,
    LendingConfig, LendingService, SqliteBlobStore, CONTACTS_BLOB_KEY, ITEMS_BLOB_KEY,
};
use log::error;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "lendtrack_cli")]
#[command(about = "Track contacts and the items lent to them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Items are addressed by list position or by handle.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Print core health and version.
    Ping,
    Contacts,
    AddContact {
        username: String,
        email: String,
    },
    SetEmail {
        username: String,
        email: String,
    },
    CanRemove {
        username: String,
    },
    RemoveContact {
        username: String,
    },
    Items,
    AddItem {
        title: String,
        #[arg(default_value = "")]
        description: String,
    },
    UpdateItem {
        #[arg(value_parser = parse_item_ref)]
        item: ItemRef,
        title: String,
        #[arg(default_value = "")]
        description: String,
    },
    RemoveItem {
        #[arg(value_parser = parse_item_ref)]
        item: ItemRef,
    },
    Lend {
        #[arg(value_parser = parse_item_ref)]
        item: ItemRef,
        username: String,
    },
    Return {
        #[arg(value_parser = parse_item_ref)]
        item: ItemRef,
    },
}

impl Commands {
    /// Maps a subcommand onto a core command; `None` for `ping`.
    fn into_lending_command(self) -> Option<LendingCommand> {
        let command = match self {
            Self::Ping => return None,
            Self::Contacts => LendingCommand::ListContacts,
            Self::AddContact { username, email } => LendingCommand::AddContact { username, email },
            Self::SetEmail { username, email } => {
                LendingCommand::UpdateContactEmail { username, email }
            }
            Self::CanRemove { username } => LendingCommand::CanRemoveContact { username },
            Self::RemoveContact { username } => LendingCommand::RemoveContact { username },
            Self::Items => LendingCommand::ListItems,
            Self::AddItem { title, description } => LendingCommand::AddItem { title, description },
            Self::UpdateItem {
                item,
                title,
                description,
            } => LendingCommand::UpdateItem {
                item,
                title,
                description,
            },
            Self::RemoveItem { item } => LendingCommand::RemoveItem { item },
            Self::Lend { item, username } => LendingCommand::LendItem {
                item,
                borrower: username,
            },
            Self::Return { item } => LendingCommand::ReturnItem { item },
        };
        Some(command)
    }
}

fn parse_item_ref(raw: &str) -> Result<ItemRef, String> {
    if let Ok(position) = raw.parse::<usize>() {
        return Ok(ItemRef::Position(position));
    }
    ItemId::parse_str(raw)
        .map(ItemRef::Id)
        .map_err(|_| format!("expected a list position or item handle, got `{raw}`"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let Some(command) = cli.command.into_lending_command() else {
        println!("lendtrack_core ping={}", lendtrack_core::ping());
        println!("lendtrack_core version={}", lendtrack_core::core_version());
        return ExitCode::SUCCESS;
    };

    match run(command) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: LendingCommand) -> Result<Vec<String>, String> {
    let config = LendingConfig::from_env().map_err(|err| err.to_string())?;
    init_logging_from_config(&config).map_err(|err| err.to_string())?;

    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let mut service = LendingService::open(
        SqliteBlobStore::new(&conn, CONTACTS_BLOB_KEY),
        SqliteBlobStore::new(&conn, ITEMS_BLOB_KEY),
    )
    .map_err(|err| err.to_string())?;

    match service.handle(command) {
        Ok(outcome) => Ok(render(&outcome)),
        Err(err) => {
            error!("event=cli_command module=cli status=error error_code={}", err.code());
            Err(err.to_string())
        }
    }
}

fn render(outcome: &CommandOutcome) -> Vec<String> {
    match outcome {
        CommandOutcome::Contacts(contacts) => contacts
            .iter()
            .enumerate()
            .map(|(index, contact)| format!("{index}\t{}", render_contact(contact)))
            .collect(),
        CommandOutcome::Contact(contact) => vec![render_contact(contact)],
        CommandOutcome::Items(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| format!("{index}\t{}", render_item(item)))
            .collect(),
        CommandOutcome::Item(item) => vec![render_item(item)],
        CommandOutcome::RemovalAllowed(allowed) => vec![format!("removal_allowed={allowed}")],
        CommandOutcome::ContactRemoved(contact) => vec![format!("removed {contact}")],
        CommandOutcome::ItemRemoved(item) => vec![format!("removed {}", item.title())],
        CommandOutcome::Reloaded { contacts, items } => {
            vec![format!("contacts={contacts} items={items}")]
        }
    }
}

fn render_contact(contact: &Contact) -> String {
    format!("{}\t{}", contact.username(), contact.email())
}

fn render_item(item: &Item) -> String {
    let borrower = item
        .borrower()
        .map(Contact::username)
        .unwrap_or("-");
    format!(
        "{}\t{}\t{}\t{}",
        item.title(),
        item.status(),
        borrower,
        item.description()
    )
}
