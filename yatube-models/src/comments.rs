use crate::{
    posts::Post,
    schema::{comments, users},
    users::User,
    Connection, Error, Result,
};
use chrono::{NaiveDateTime, Utc};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

#[derive(Queryable, Identifiable, Clone, Debug, Serialize)]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub text: String,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "comments"]
pub struct NewComment {
    pub post_id: i32,
    pub author_id: i32,
    pub text: String,
    pub creation_date: NaiveDateTime,
}

impl Comment {
    insert!(comments, NewComment);
    get!(comments);

    /// Comments of a post with their authors, oldest first.
    pub fn list_for_post(conn: &Connection, post_id: i32) -> Result<Vec<(Comment, User)>> {
        comments::table
            .inner_join(users::table)
            .filter(comments::post_id.eq(post_id))
            .order((comments::creation_date.asc(), comments::id.asc()))
            .load::<(Comment, User)>(conn)
            .map_err(Error::from)
    }

    pub fn count_for_post(conn: &Connection, post_id: i32) -> Result<i64> {
        comments::table
            .filter(comments::post_id.eq(post_id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }
}

impl NewComment {
    pub fn new(post: &Post, author: &User, text: String) -> Self {
        NewComment {
            post_id: post.id,
            author_id: author.id,
            text,
            creation_date: Utc::now().naive_utc(),
        }
    }
}
