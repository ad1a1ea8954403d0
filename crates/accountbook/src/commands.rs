//! Subcommand execution against an account store.

use std::io::Write;

use accountbook_core::storage::KeyValueBackend;
use accountbook_core::{Account, AccountId, AccountStore, Error, IdGenerator, LabelItem};
use anyhow::Context;
use tracing::info;

use crate::cli::{Command, SetArgs};

/// Runs `command` and writes its output to `out`.
///
/// Mutating commands flush the store at the end so write failures surface
/// as errors instead of being logged and dropped.
pub fn run<B, G, W>(
    store: &mut AccountStore<B, G>,
    command: Command,
    json: bool,
    out: &mut W,
) -> anyhow::Result<()>
where
    B: KeyValueBackend,
    G: IdGenerator,
    W: Write,
{
    match command {
        Command::List => {
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(store.accounts())?)?;
            } else {
                for account in store.accounts() {
                    write_row(out, account)?;
                }
            }
            return Ok(());
        }
        Command::Show { id } => {
            let id = AccountId::from(id);
            let account = store
                .get(&id)
                .ok_or_else(|| Error::AccountNotFound(id.to_string()))?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(account)?)?;
            } else {
                write_row(out, account)?;
            }
            return Ok(());
        }
        Command::Add => {
            let id = store.add_empty();
            info!("Created account {id}");
            writeln!(out, "{id}")?;
        }
        Command::Set(SetArgs {
            id,
            kind,
            login,
            password,
            no_password,
            labels,
        }) => {
            let id = AccountId::from(id);
            let mut account = store
                .get(&id)
                .cloned()
                .unwrap_or_else(|| Account::empty(id.clone()));
            if let Some(kind) = kind {
                account.kind = kind;
            }
            if let Some(login) = login {
                account.login = login;
            }
            if no_password {
                account.password = None;
            } else if password.is_some() {
                account.password = password;
            }
            if !labels.is_empty() {
                account.label = labels.into_iter().map(LabelItem::new).collect();
            }
            store.upsert(account);
            info!("Saved account {id}");
        }
        Command::Remove { id } => {
            let id = AccountId::from(id);
            store.remove(&id);
            info!("Removed account {id}");
        }
    }

    store.flush().context("failed to save accounts")?;
    Ok(())
}

fn write_row<W: Write>(out: &mut W, account: &Account) -> std::io::Result<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}",
        account.id,
        account.kind,
        account.login,
        account.display_label()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use accountbook_core::AccountType;
    use accountbook_core::storage::{FileBackend, MemoryBackend};

    fn exec<B: KeyValueBackend>(store: &mut AccountStore<B>, command: Command, json: bool) -> String {
        let mut out = Vec::new();
        run(store, command, json, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn set(id: &str) -> SetArgs {
        SetArgs {
            id: id.to_string(),
            ..SetArgs::default()
        }
    }

    #[test]
    fn test_add_prints_id() {
        let mut store = AccountStore::open(MemoryBackend::new());
        let out = exec(&mut store, Command::Add, false);
        assert_eq!(out.trim(), store.accounts()[0].id.as_str());
    }

    #[test]
    fn test_set_updates_only_given_fields() {
        let mut store = AccountStore::open(MemoryBackend::new());
        let id = store.add_empty();

        let command = Command::Set(SetArgs {
            kind: Some(AccountType::Ldap),
            login: Some("svc".to_string()),
            labels: vec!["Build".to_string(), "Server".to_string()],
            ..set(id.as_str())
        });
        exec(&mut store, command, false);

        let account = store.get(&id).unwrap();
        assert_eq!(account.kind, AccountType::Ldap);
        assert_eq!(account.login, "svc");
        assert_eq!(account.display_label(), "Build Server");
        assert_eq!(account.password.as_deref(), Some(""));

        let command = Command::Set(SetArgs {
            no_password: true,
            ..set(id.as_str())
        });
        exec(&mut store, command, false);
        let account = store.get(&id).unwrap();
        assert_eq!(account.password, None);
        assert_eq!(account.login, "svc");
    }

    #[test]
    fn test_set_unknown_id_inserts() {
        let mut store = AccountStore::open(MemoryBackend::new());
        let command = Command::Set(SetArgs {
            password: Some("pw".to_string()),
            ..set("manual")
        });
        exec(&mut store, command, false);

        assert_eq!(store.len(), 1);
        let account = store.get(&AccountId::from("manual")).unwrap();
        assert_eq!(account.kind, AccountType::Local);
        assert_eq!(account.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_list_rows_and_json() {
        let mut store = AccountStore::open(MemoryBackend::new());
        let command = Command::Set(SetArgs {
            login: Some("root".to_string()),
            labels: vec!["Admin".to_string()],
            ..set("a1")
        });
        exec(&mut store, command, false);

        assert_eq!(exec(&mut store, Command::List, false), "a1\tLOCAL\troot\tAdmin\n");

        let json = exec(&mut store, Command::List, true);
        let parsed: Vec<Account> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, store.accounts());
    }

    #[test]
    fn test_show_missing_is_error() {
        let mut store = AccountStore::open(MemoryBackend::new());
        let mut out = Vec::new();
        let err = run(
            &mut store,
            Command::Show {
                id: "nope".to_string(),
            },
            false,
            &mut out,
        )
        .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_remove_unknown_succeeds() {
        let mut store = AccountStore::open(MemoryBackend::new());
        exec(&mut store, Command::Add, false);
        exec(
            &mut store,
            Command::Remove {
                id: "ghost".to_string(),
            },
            false,
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut store = AccountStore::open(MemoryBackend::with_quota(16));
        let mut out = Vec::new();
        let err = run(&mut store, Command::Add, false, &mut out).unwrap_err();
        assert!(err.to_string().contains("failed to save accounts"));
    }

    #[test]
    fn test_changes_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AccountStore::open(FileBackend::new(dir.path()));
        let out = exec(&mut store, Command::Add, false);

        let reopened = AccountStore::open(FileBackend::new(dir.path()));
        assert_eq!(reopened.accounts()[0].id.as_str(), out.trim());
    }
}
