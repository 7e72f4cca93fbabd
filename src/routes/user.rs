use rocket::{
    http::uri::Origin,
    response::{Flash, Redirect},
    State,
};
use tracing::debug;

use crate::routes::errors::ErrorPage;
use crate::template_utils::Rendered;
use crate::utils;
use yatube_models::{
    db_conn::DbConn, feeds, follows::Follow, pagination::Paginator, users::User,
};

#[get("/profile/<name>?<page>")]
pub fn profile(
    name: &str,
    conn: DbConn,
    paginator: &State<Paginator>,
    account: Option<User>,
    page: Option<String>,
) -> Result<Rendered, ErrorPage> {
    let feed = feeds::profile(&*conn, paginator, name, account.as_ref(), page.as_deref())?;
    let is_not_current_user = account.map_or(true, |a| a.id != feed.author.id);
    Ok(render!(
        "posts/profile.html",
        &json!({
            "author": feed.author,
            "count_of_posts": feed.count_of_posts,
            "following": feed.is_following.unwrap_or(false),
            "is_not_current_user": is_not_current_user,
            "page": feed.page,
        })
    )?)
}

#[get("/follow?<page>")]
pub fn follow_index(
    conn: DbConn,
    paginator: &State<Paginator>,
    user: User,
    page: Option<String>,
) -> Result<Rendered, ErrorPage> {
    let feed = feeds::following(&*conn, paginator, &user, page.as_deref())?;
    Ok(render!("posts/follow.html", &feed)?)
}

#[get("/follow", rank = 2)]
pub fn follow_index_auth(origin: &Origin<'_>) -> Flash<Redirect> {
    utils::requires_login(
        "You need to be logged in to see the posts of the authors you follow.",
        origin,
    )
}

#[get("/profile/<name>/follow")]
pub fn follow(name: &str, conn: DbConn, user: User) -> Result<Redirect, ErrorPage> {
    let author = User::find_by_name(&*conn, name)?;
    if Follow::follow(&*conn, &user, &author)?.is_some() {
        debug!("{} follows {}", user.username, author.username);
    }
    Ok(Redirect::to(utils::slashed(uri!(profile(name = name, page = _)))))
}

#[get("/profile/<_>/follow", rank = 2)]
pub fn follow_auth(origin: &Origin<'_>) -> Flash<Redirect> {
    utils::requires_login("You need to be logged in to follow someone.", origin)
}

#[get("/profile/<name>/unfollow")]
pub fn unfollow(name: &str, conn: DbConn, user: User) -> Result<Redirect, ErrorPage> {
    let author = User::find_by_name(&*conn, name)?;
    Follow::unfollow(&*conn, &user, &author)?;
    Ok(Redirect::to(utils::slashed(uri!(profile(name = name, page = _)))))
}

#[get("/profile/<_>/unfollow", rank = 2)]
pub fn unfollow_auth(origin: &Origin<'_>) -> Flash<Redirect> {
    utils::requires_login("You need to be logged in to unfollow someone.", origin)
}
