use crate::{schema::follows, users::User, Connection, Error, Result};
use diesel::{
    self,
    result::{DatabaseErrorKind, Error as DieselError},
    Connection as _, ExpressionMethods, QueryDsl, RunQueryDsl,
};

/// A directed edge: `follower_id` reads the posts of `following_id`.
#[derive(Clone, Debug, PartialEq, Queryable, Identifiable)]
pub struct Follow {
    pub id: i32,
    pub follower_id: i32,
    pub following_id: i32,
}

#[derive(Insertable)]
#[table_name = "follows"]
pub struct NewFollow {
    pub follower_id: i32,
    pub following_id: i32,
}

impl Follow {
    insert!(follows, NewFollow);
    get!(follows);

    pub fn find(conn: &Connection, from: i32, to: i32) -> Result<Follow> {
        follows::table
            .filter(follows::follower_id.eq(from))
            .filter(follows::following_id.eq(to))
            .get_result(conn)
            .map_err(Error::from)
    }

    /// Makes `follower` follow `author`.
    ///
    /// Following yourself does nothing and gives `None`. Following someone
    /// twice gives back the edge that already exists.
    pub fn follow(conn: &Connection, follower: &User, author: &User) -> Result<Option<Follow>> {
        if follower.id == author.id {
            return Ok(None);
        }

        let res = conn.transaction::<_, Error, _>(|| {
            match Follow::find(conn, follower.id, author.id) {
                Ok(existing) => Ok(existing),
                Err(Error::NotFound) => Follow::insert(
                    conn,
                    NewFollow {
                        follower_id: follower.id,
                        following_id: author.id,
                    },
                ),
                Err(e) => Err(e),
            }
        });

        Follow::or_existing(conn, res, follower.id, author.id).map(Some)
    }

    /// Turns a unique violation, raised when someone else inserted the same
    /// edge in the meantime, into that edge.
    fn or_existing(
        conn: &Connection,
        inserted: Result<Follow>,
        from: i32,
        to: i32,
    ) -> Result<Follow> {
        match inserted {
            Err(Error::Db(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))) => {
                Follow::find(conn, from, to)
            }
            res => res,
        }
    }

    /// Removes the edge if there is one.
    pub fn unfollow(conn: &Connection, follower: &User, author: &User) -> Result<()> {
        diesel::delete(
            follows::table
                .filter(follows::follower_id.eq(follower.id))
                .filter(follows::following_id.eq(author.id)),
        )
        .execute(conn)
        .map(|_| ())
        .map_err(Error::from)
    }

    pub fn is_following(conn: &Connection, follower: &User, author: &User) -> Result<bool> {
        follower.is_following(conn, author.id)
    }
}
