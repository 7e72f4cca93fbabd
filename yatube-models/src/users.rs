use crate::{
    db_conn::DbConn,
    posts::Post,
    schema::{follows, users},
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use rocket::{
    http::Status,
    outcome::{try_outcome, IntoOutcome},
    request::{self, FromRequest, Request},
};

/// Name of the private cookie holding the id of the logged in user
pub const AUTH_COOKIE: &str = "user_id";

#[derive(Queryable, Identifiable, Clone, Debug, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub hashed_password: Option<String>,
    pub is_admin: bool,
    pub creation_date: NaiveDateTime,
}

#[derive(Default, Insertable)]
#[table_name = "users"]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub hashed_password: Option<String>,
    pub is_admin: bool,
}

impl User {
    insert!(users, NewUser);
    get!(users);
    find_by!(users, find_by_name, username as &str);
    find_by!(users, find_by_email, email as &str);

    pub fn list(conn: &Connection) -> Result<Vec<User>> {
        users::table
            .order(users::username.asc())
            .load::<User>(conn)
            .map_err(Error::from)
    }

    /// Deletes the account. Posts, comments and follows go with it.
    pub fn delete(&self, conn: &Connection) -> Result<()> {
        diesel::delete(self)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }

    pub fn set_admin(&self, conn: &Connection, is_admin: bool) -> Result<()> {
        diesel::update(self)
            .set(users::is_admin.eq(is_admin))
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }

    /// The name to show, falling back to the handle.
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }

    pub fn hash_pass(pass: &str) -> Result<String> {
        bcrypt::hash(pass, 10).map_err(Error::from)
    }

    pub fn login(conn: &Connection, ident: &str, password: &str) -> Result<User> {
        let user = match User::find_by_name(conn, ident) {
            Ok(user) => user,
            Err(_) => User::find_by_email(conn, ident)?,
        };

        match user.hashed_password {
            Some(ref hash) if bcrypt::verify(password, hash).unwrap_or(false) => Ok(user),
            _ => Err(Error::NotFound),
        }
    }

    pub fn reset_password(&self, conn: &Connection, pass: &str) -> Result<()> {
        diesel::update(self)
            .set(users::hashed_password.eq(User::hash_pass(pass)?))
            .execute(conn)?;
        Ok(())
    }

    pub fn count_posts(&self, conn: &Connection) -> Result<i64> {
        Post::count_for_author(conn, self.id)
    }

    pub fn count_followers(&self, conn: &Connection) -> Result<i64> {
        follows::table
            .filter(follows::following_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn count_followed(&self, conn: &Connection) -> Result<i64> {
        follows::table
            .filter(follows::follower_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn is_following(&self, conn: &Connection, other_id: i32) -> Result<bool> {
        follows::table
            .filter(follows::follower_id.eq(self.id))
            .filter(follows::following_id.eq(other_id))
            .count()
            .get_result::<i64>(conn)
            .map_err(Error::from)
            .map(|r| r > 0)
    }
}

impl NewUser {
    /// Creates a new account, with an already hashed password (or none)
    pub fn new_local(
        conn: &Connection,
        username: String,
        display_name: String,
        is_admin: bool,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<User> {
        let username = username.trim().to_owned();
        if username.is_empty() || username.chars().any(|c| c == '/' || c.is_whitespace()) {
            return Err(Error::InvalidArgument(format!(
                "{:?} is not a valid username",
                username
            )));
        }

        let user = User::insert(
            conn,
            NewUser {
                username,
                display_name,
                email,
                hashed_password: password,
                is_admin,
            },
        )?;
        info!("Created user {}", user.username);
        Ok(user)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<User, ()> {
        let conn = try_outcome!(request.guard::<DbConn>().await);
        request
            .cookies()
            .get_private(AUTH_COOKIE)
            .and_then(|cookie| cookie.value().parse().ok())
            .and_then(|id| User::get(&*conn, id).ok())
            .or_forward(Status::Unauthorized)
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{tests::db, Connection as Conn};
    use diesel::Connection;

    pub(crate) fn fill_database(conn: &Conn) -> Vec<User> {
        let admin = NewUser::new_local(
            conn,
            "admin".to_owned(),
            "The admin".to_owned(),
            true,
            Some("admin@example.com".to_owned()),
            None,
        )
        .unwrap();
        let user = NewUser::new_local(
            conn,
            "user".to_owned(),
            "Some user".to_owned(),
            false,
            Some("user@example.com".to_owned()),
            None,
        )
        .unwrap();
        let other = NewUser::new_local(
            conn,
            "other".to_owned(),
            String::new(),
            false,
            None,
            None,
        )
        .unwrap();
        vec![admin, user, other]
    }

    #[test]
    fn find_by() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = fill_database(&conn);
            assert_eq!(User::find_by_name(&conn, "user").unwrap(), users[1]);
            assert_eq!(
                User::find_by_email(&conn, "admin@example.com").unwrap(),
                users[0]
            );
            assert_eq!(User::get(&conn, users[2].id).unwrap().username, "other");
            assert!(matches!(
                User::find_by_name(&conn, "nobody"),
                Err(Error::NotFound)
            ));
            Ok(())
        });
    }

    #[test]
    fn rejects_invalid_usernames() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            for name in &["", "   ", "a/b", "two words"] {
                assert!(matches!(
                    NewUser::new_local(&conn, name.to_string(), String::new(), false, None, None),
                    Err(Error::InvalidArgument(_))
                ));
            }
            Ok(())
        });
    }

    #[test]
    fn usernames_are_unique() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            fill_database(&conn);
            assert!(NewUser::new_local(
                &conn,
                "user".to_owned(),
                String::new(),
                false,
                None,
                None
            )
            .is_err());
            Ok(())
        });
    }

    #[test]
    fn name_falls_back_to_username() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = fill_database(&conn);
            assert_eq!(users[1].name(), "Some user");
            assert_eq!(users[2].name(), "other");
            Ok(())
        });
    }

    #[test]
    fn auth() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            fill_database(&conn);
            let test_user = NewUser::new_local(
                &conn,
                "test".to_owned(),
                "test user".to_owned(),
                false,
                Some("test@example.com".to_owned()),
                Some(bcrypt::hash("test_password", 4).unwrap()),
            )
            .unwrap();

            assert_eq!(
                User::login(&conn, "test", "test_password").unwrap().id,
                test_user.id
            );
            assert_eq!(
                User::login(&conn, "test@example.com", "test_password")
                    .unwrap()
                    .id,
                test_user.id
            );
            assert!(User::login(&conn, "test", "other_password").is_err());
            assert!(User::login(&conn, "nobody", "test_password").is_err());
            // accounts without a password can't log in
            assert!(User::login(&conn, "user", "").is_err());
            Ok(())
        });
    }

    #[test]
    fn reset_password() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = fill_database(&conn);
            assert!(User::login(&conn, "user", "first").is_err());

            users[1].reset_password(&conn, "first").unwrap();
            assert_eq!(User::login(&conn, "user", "first").unwrap().id, users[1].id);

            users[1].reset_password(&conn, "second").unwrap();
            assert!(User::login(&conn, "user", "first").is_err());
            assert!(User::login(&conn, "user@example.com", "second").is_ok());
            assert!(User::login(&conn, "other", "second").is_err());
            Ok(())
        });
    }

    #[test]
    fn set_admin() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = fill_database(&conn);
            users[1].set_admin(&conn, true).unwrap();
            assert!(User::get(&conn, users[1].id).unwrap().is_admin);
            Ok(())
        });
    }
}
