use getset::{Getters, Setters};
use serde::{Deserialize, Serialize};

use crate::ids::{DisplayName, MailAddr, Password};

/// A registered user. Keyed by [`crate::ids::UserId`] in the user map;
/// never deleted, only mutated via `modify_profile`.
#[derive(Debug, Clone, Getters, Setters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct User {
    password: Password,
    name: DisplayName,
    mail: MailAddr,
    #[getset(set = "pub")]
    privilege: u8,
}

impl User {
    pub fn new(password: Password, name: DisplayName, mail: MailAddr, privilege: u8) -> Self {
        Self {
            password,
            name,
            mail,
            privilege,
        }
    }

    pub fn set_password(&mut self, password: Password) {
        self.password = password;
    }

    pub fn set_name(&mut self, name: DisplayName) {
        self.name = name;
    }

    pub fn set_mail(&mut self, mail: MailAddr) {
        self.mail = mail;
    }
}
