use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use tracing::debug;
use tribune_types::models::{Role, User};

use crate::{IdSequence, read, write};

/// Fields of an account that has not been assigned an id yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub nickname: String,
    pub role: Role,
}

#[derive(Default)]
struct Accounts {
    by_name: HashMap<String, User>,
    /// id -> username, kept in id order for listings
    names: BTreeMap<u64, String>,
}

/// Accounts keyed by username.
#[derive(Default)]
pub struct UserRepo {
    accounts: RwLock<Accounts>,
    ids: IdSequence,
}

impl UserRepo {
    /// Inserts a new account. Returns `None` if the username is taken; the
    /// uniqueness check and the insert happen under one write lock.
    pub fn insert(&self, new: NewUser) -> Option<User> {
        let mut accounts = write(&self.accounts);
        if accounts.by_name.contains_key(&new.username) {
            return None;
        }

        let user = User {
            id: self.ids.next(),
            username: new.username,
            password: new.password,
            nickname: new.nickname,
            role: new.role,
        };
        accounts.names.insert(user.id, user.username.clone());
        accounts.by_name.insert(user.username.clone(), user.clone());
        debug!("Stored user {} (id {})", user.username, user.id);
        Some(user)
    }

    pub fn get(&self, username: &str) -> Option<User> {
        read(&self.accounts).by_name.get(username).cloned()
    }

    pub fn get_by_id(&self, id: u64) -> Option<User> {
        let accounts = read(&self.accounts);
        accounts
            .names
            .get(&id)
            .and_then(|name| accounts.by_name.get(name))
            .cloned()
    }

    pub fn nickname_of(&self, id: u64) -> Option<String> {
        self.get_by_id(id).map(|u| u.nickname)
    }

    /// Usernames in id order.
    pub fn usernames(&self) -> Vec<String> {
        read(&self.accounts).names.values().cloned().collect()
    }

    /// Runs `f` against the stored account while holding the write lock, so a
    /// precondition checked inside `f` cannot be invalidated before its
    /// mutation lands. `f` must check before it mutates: an `Err` does not
    /// roll anything back. Returns `None` if the account does not exist.
    pub fn modify<T, E>(
        &self,
        username: &str,
        f: impl FnOnce(&mut User) -> Result<T, E>,
    ) -> Option<Result<T, E>> {
        let mut accounts = write(&self.accounts);
        accounts.by_name.get_mut(username).map(f)
    }

    pub fn remove(&self, username: &str) -> Option<User> {
        self.remove_if(username, |_| Ok::<(), ()>(()))
            .and_then(Result::ok)
    }

    /// Removes the account only if `guard` accepts it, atomically with the check.
    pub fn remove_if<E>(
        &self,
        username: &str,
        guard: impl FnOnce(&User) -> Result<(), E>,
    ) -> Option<Result<User, E>> {
        let mut accounts = write(&self.accounts);
        let user = accounts.by_name.get(username)?;
        if let Err(e) = guard(user) {
            return Some(Err(e));
        }
        let user = accounts.by_name.remove(username)?;
        accounts.names.remove(&user.id);
        debug!("Removed user {} (id {})", user.username, user.id);
        Some(Ok(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn member(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            password: "secret99".to_string(),
            nickname: format!("{name}nick"),
            role: Role::Member,
        }
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let repo = UserRepo::default();
        let a = repo.insert(member("alice01")).unwrap();
        let b = repo.insert(member("bobby02")).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(repo.usernames(), vec!["alice01", "bobby02"]);
        assert_eq!(repo.get_by_id(2).unwrap().username, "bobby02");
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let repo = UserRepo::default();
        assert!(repo.insert(member("alice01")).is_some());
        assert!(repo.insert(member("alice01")).is_none());
        assert_eq!(repo.usernames().len(), 1);
    }

    #[test]
    fn concurrent_registration_has_one_winner() {
        let repo = Arc::new(UserRepo::default());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repo = repo.clone();
                std::thread::spawn(move || repo.insert(member("contested")).is_some())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(repo.usernames().len(), 1);
    }

    #[test]
    fn modify_reports_guard_failure() {
        let repo = UserRepo::default();
        repo.insert(member("alice01")).unwrap();

        let denied: Option<Result<(), &str>> = repo.modify("alice01", |u| {
            if u.role == Role::Member {
                return Err("members are protected");
            }
            u.nickname = "changed".into();
            Ok(())
        });
        assert_eq!(denied, Some(Err("members are protected")));
        assert_eq!(repo.get("alice01").unwrap().nickname, "alice01nick");

        let missing = repo.modify("nobody", |_| Ok::<(), ()>(()));
        assert!(missing.is_none());
    }

    #[test]
    fn remove_if_keeps_guarded_account() {
        let repo = UserRepo::default();
        repo.insert(NewUser {
            role: Role::Admin,
            ..member("root001")
        })
        .unwrap();

        let result = repo.remove_if("root001", |u| {
            if u.role == Role::Admin { Err("admin") } else { Ok(()) }
        });
        assert_eq!(result, Some(Err("admin")));
        assert!(repo.get("root001").is_some());

        assert!(repo.remove("root001").is_some());
        assert!(repo.get_by_id(1).is_none());
        assert!(repo.usernames().is_empty());
    }
}
