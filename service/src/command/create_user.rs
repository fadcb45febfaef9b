//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Password, Phone};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Name`] of a new [`User`].
    pub name: user::Name,

    /// [`Email`] of a new [`User`] to log in with.
    pub email: user::Email,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`Phone`] of a new [`User`].
    pub phone: Option<user::Phone>,

    /// Indicates whether a new [`User`] is going to list parking.
    pub is_host: bool,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'l> Database<
            Select<By<Option<User>, &'l user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            name,
            email,
            password,
            phone,
            is_host,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let user = User {
            id: user::Id::new(),
            name,
            email,
            password_hash: user::PasswordHash::new(password.expose_secret()),
            phone,
            is_host,
            created_at: DateTime::now().coerce(),
        };

        tx.execute(Insert(user.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation() {
                    tracerr::new!(E::EmailOccupied(user.email.clone()))
                } else {
                    tracerr::map_from(e)
                }
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Email`] is already occupied.
    #[display("`{_0}` email is occupied")]
    EmailOccupied(#[error(not(source))] user::Email),
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        domain::user,
        infra::database::memory,
        Command as _,
    };

    use super::{CreateUser, ExecutionError};

    fn create(email: &str) -> CreateUser {
        CreateUser {
            name: user::Name::new("John Doe").unwrap(),
            email: user::Email::new(email).unwrap(),
            password: SecretBox::new(Box::new(
                user::Password::new("qwerty").unwrap(),
            )),
            phone: None,
            is_host: true,
        }
    }

    #[tokio::test]
    async fn email_is_unique() {
        let service = memory::service();

        let user = service.execute(create("john@example.com")).await.unwrap();
        assert!(user.is_host);

        let err = service
            .execute(create("JOHN@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::EmailOccupied(_)));
        assert_eq!(service.database().store().users.len(), 1);
    }

    #[tokio::test]
    async fn stores_only_password_hash() {
        let service = memory::service();

        let user = service.execute(create("jane@example.com")).await.unwrap();

        let stored = service.database().store().users[&user.id].clone();
        assert_ne!(stored.password_hash.to_string(), "qwerty");
        assert!(!stored.password_hash.to_string().contains("qwerty"));
        assert!(stored
            .password_hash
            .verify(&user::Password::new("qwerty").unwrap()));
    }
}
