//! Page routing
//!
//! Decides which page a request lands on given who is signed in. Pages that
//! need a user are unreachable without one; admins and users each have a
//! home page and are kept off the other's.

use std::fmt;

use crate::types::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Login,
    Register,
    Chat,
    Profile,
    Admin,
}

impl Page {
    pub fn requires_user(&self) -> bool {
        !matches!(self, Page::Login | Page::Register)
    }

    /// Landing page after sign-in
    pub fn home(user: &User) -> Page {
        if user.is_admin() {
            Page::Admin
        } else {
            Page::Chat
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Page::Login => "login",
            Page::Register => "register",
            Page::Chat => "chat",
            Page::Profile => "profile",
            Page::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// Page that a request for `requested` resolves to
pub fn resolve(requested: Page, user: Option<&User>) -> Page {
    let user = match user {
        Some(user) => user,
        None if requested.requires_user() => return Page::Login,
        None => return requested,
    };

    match requested {
        Page::Login | Page::Register => Page::home(user),
        Page::Chat | Page::Profile if user.is_admin() => Page::Admin,
        Page::Admin if !user.is_admin() => Page::Profile,
        page => page,
    }
}
