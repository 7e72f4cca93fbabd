use crate::{
    comments::Comment,
    schema::posts,
    users::User,
    Connection, Error, Result,
};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

#[derive(Queryable, Identifiable, Clone, Debug, PartialEq, Serialize)]
pub struct Post {
    pub id: i32,
    pub text: String,
    pub creation_date: NaiveDateTime,
    pub author_id: i32,
    pub group_id: Option<i32>,
    /// Path of the picture, relative to the media directory
    pub image: Option<String>,
}

#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub text: String,
    pub creation_date: NaiveDateTime,
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub image: Option<String>,
}

/// The parts of a post its author can change.
#[derive(AsChangeset)]
#[table_name = "posts"]
#[changeset_options(treat_none_as_null = "true")]
pub struct PostUpdate {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<String>,
}

impl Post {
    insert!(posts, NewPost);
    get!(posts);

    pub fn count(conn: &Connection) -> Result<i64> {
        posts::table
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn count_for_author(conn: &Connection, author_id: i32) -> Result<i64> {
        posts::table
            .filter(posts::author_id.eq(author_id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn get_comments(&self, conn: &Connection) -> Result<Vec<(Comment, User)>> {
        Comment::list_for_post(conn, self.id)
    }

    pub fn is_author(&self, user: &User) -> bool {
        self.author_id == user.id
    }

    pub fn update(&self, conn: &Connection, changes: &PostUpdate) -> Result<Post> {
        diesel::update(self).set(changes).execute(conn)?;
        Post::get(conn, self.id)
    }

    pub fn delete(&self, conn: &Connection) -> Result<()> {
        diesel::delete(self)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }
}

impl NewPost {
    /// A post written now by `author`
    pub fn new(text: String, author: &User, group_id: Option<i32>, image: Option<String>) -> Self {
        NewPost {
            text,
            creation_date: Utc::now().naive_utc(),
            author_id: author.id,
            group_id,
            image,
        }
    }
}
