//! User commands: plain CRUD over the users collection.

use serde::Serialize;

use super::Output;
use crate::models::{User, UserRole};
use crate::storage::{Order, Storage, generate_id};
use crate::Result;

/// Result of `mctl user list`.
#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<User>,
}

impl Output for UserList {
    fn to_human(&self) -> String {
        if self.users.is_empty() {
            return "No users found".to_string();
        }
        self.users
            .iter()
            .map(|u| format!("{}  [{}] {}  <{}>", u.id, u.role, u.name, u.email))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for User {
    fn to_human(&self) -> String {
        format!("{}  [{}] {}  <{}>", self.id, self.role, self.name, self.email)
    }
}

/// List users in creation order.
pub fn user_list(storage: &Storage) -> Result<UserList> {
    Ok(UserList {
        users: storage.scan(Order::Asc)?,
    })
}

/// Show a single user.
pub fn user_show(storage: &Storage, user_id: &str) -> Result<User> {
    storage.get(user_id)
}

/// Create a user. Email uniqueness is not enforced.
pub fn user_create(
    storage: &mut Storage,
    name: &str,
    email: &str,
    role: UserRole,
    avatar: Option<String>,
) -> Result<User> {
    let mut user = User::new(
        generate_id("usr", email),
        name.to_string(),
        email.to_string(),
        role,
    );
    user.avatar = avatar;
    storage.insert(&user)?;
    Ok(user)
}

/// Arguments for `mctl user update`. Unset fields are left unchanged.
#[derive(Debug, Default)]
pub struct UserUpdateArgs {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub avatar: Option<String>,
}

/// Patch user fields. Users carry no timestamps to bump.
pub fn user_update(storage: &mut Storage, user_id: &str, args: UserUpdateArgs) -> Result<User> {
    let mut user: User = storage.get(user_id)?;

    if let Some(name) = args.name {
        user.name = name;
    }
    if let Some(email) = args.email {
        user.email = email;
    }
    if let Some(role) = args.role {
        user.role = role;
    }
    if let Some(avatar) = args.avatar {
        user.avatar = Some(avatar);
    }

    storage.put(&user)?;
    Ok(user)
}

/// Result of `mctl user delete`.
#[derive(Debug, Serialize)]
pub struct UserDeleted {
    pub id: String,
}

impl Output for UserDeleted {
    fn to_human(&self) -> String {
        format!("Deleted {}", self.id)
    }
}

/// Delete a user. Tasks, projects, comments, and documents keep their
/// now-dangling user ids; reads resolve those to nothing.
pub fn user_delete(storage: &mut Storage, user_id: &str) -> Result<UserDeleted> {
    storage.delete::<User>(user_id)?;
    Ok(UserDeleted {
        id: user_id.to_string(),
    })
}
