//! Paginated lists of posts, newest first.
//!
//! Every feed runs one `COUNT` query to size the pagination, one query for
//! the ids of the requested page, and a single join to load those posts
//! with their author and group.

use crate::{
    groups::Group,
    pagination::{Page, PageWindow, Paginator},
    posts::Post,
    schema::{follows, groups, posts, users},
    users::User,
    Backend, Connection, Error, Result,
};
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl};

/// A post, ready to be displayed in a list
#[derive(Clone, Debug, Serialize)]
pub struct FeedEntry {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
}

/// One page of a feed
pub type Feed = Page<FeedEntry>;

#[derive(Debug, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Feed,
}

#[derive(Debug, Serialize)]
pub struct ProfileFeed {
    pub author: User,
    pub count_of_posts: i64,
    /// Whether the viewer follows this author; `None` for anonymous
    /// visitors and for the author looking at their own profile.
    pub is_following: Option<bool>,
    pub page: Feed,
}

#[derive(Debug, Serialize)]
pub struct FollowingFeed {
    pub page: Feed,
    pub is_no_following: bool,
}

enum Scope {
    All,
    Group(i32),
    Author(i32),
    FollowedBy(i32),
}

impl Scope {
    fn boxed(&self) -> posts::BoxedQuery<'static, Backend> {
        let query = posts::table.into_boxed();
        match *self {
            Scope::Group(id) => query.filter(posts::group_id.eq(id)),
            Scope::Author(id) => query.filter(posts::author_id.eq(id)),
            Scope::All | Scope::FollowedBy(_) => query,
        }
    }

    fn count(&self, conn: &Connection) -> Result<i64> {
        let count = match *self {
            Scope::FollowedBy(id) => {
                let followed = follows::table
                    .filter(follows::follower_id.eq(id))
                    .select(follows::following_id);
                posts::table
                    .filter(posts::author_id.eq_any(followed))
                    .count()
                    .get_result::<i64>(conn)
            }
            _ => self.boxed().count().get_result::<i64>(conn),
        };
        count.map_err(Error::from)
    }

    fn page_ids(&self, conn: &Connection, window: &PageWindow) -> Result<Vec<i32>> {
        let ids = match *self {
            Scope::FollowedBy(id) => {
                let followed = follows::table
                    .filter(follows::follower_id.eq(id))
                    .select(follows::following_id);
                posts::table
                    .filter(posts::author_id.eq_any(followed))
                    .select(posts::id)
                    .order((posts::creation_date.desc(), posts::id.desc()))
                    .offset(window.offset)
                    .limit(window.limit)
                    .load::<i32>(conn)
            }
            _ => self
                .boxed()
                .select(posts::id)
                .order((posts::creation_date.desc(), posts::id.desc()))
                .offset(window.offset)
                .limit(window.limit)
                .load::<i32>(conn),
        };
        ids.map_err(Error::from)
    }

    fn load(&self, conn: &Connection, paginator: &Paginator, requested: Option<&str>) -> Result<Feed> {
        let total = self.count(conn)?;
        let window = paginator.window(total, requested);
        let ids = self.page_ids(conn, &window)?;

        let entries = posts::table
            .inner_join(users::table)
            .left_join(groups::table)
            .filter(posts::id.eq_any(ids))
            .order((posts::creation_date.desc(), posts::id.desc()))
            .load::<(Post, User, Option<Group>)>(conn)?
            .into_iter()
            .map(|(post, author, group)| FeedEntry {
                post,
                author,
                group,
            })
            .collect();
        Ok(paginator.page(entries, window, total))
    }
}

/// Every post of the site
pub fn home(conn: &Connection, paginator: &Paginator, requested: Option<&str>) -> Result<Feed> {
    Scope::All.load(conn, paginator, requested)
}

pub fn group(
    conn: &Connection,
    paginator: &Paginator,
    slug: &str,
    requested: Option<&str>,
) -> Result<GroupFeed> {
    let group = Group::find_by_slug(conn, slug)?;
    let page = Scope::Group(group.id).load(conn, paginator, requested)?;
    Ok(GroupFeed { group, page })
}

pub fn profile(
    conn: &Connection,
    paginator: &Paginator,
    username: &str,
    viewer: Option<&User>,
    requested: Option<&str>,
) -> Result<ProfileFeed> {
    let author = User::find_by_name(conn, username)?;
    let page = Scope::Author(author.id).load(conn, paginator, requested)?;
    let is_following = match viewer {
        Some(viewer) if viewer.id != author.id => Some(viewer.is_following(conn, author.id)?),
        _ => None,
    };
    Ok(ProfileFeed {
        count_of_posts: page.count,
        author,
        is_following,
        page,
    })
}

/// Posts of the authors `viewer` follows
pub fn following(
    conn: &Connection,
    paginator: &Paginator,
    viewer: &User,
    requested: Option<&str>,
) -> Result<FollowingFeed> {
    let page = Scope::FollowedBy(viewer.id).load(conn, paginator, requested)?;
    Ok(FollowingFeed {
        is_no_following: page.is_empty(),
        page,
    })
}

/// Used by callers that only have an id at hand, like the post detail view.
pub fn entry(conn: &Connection, post_id: i32) -> Result<FeedEntry> {
    let (post, author, group) = posts::table
        .inner_join(users::table)
        .left_join(groups::table)
        .filter(posts::id.eq(post_id))
        .first::<(Post, User, Option<Group>)>(conn)
        .map_err(Error::from)?;
    Ok(FeedEntry {
        post,
        author,
        group,
    })
}
