use rocket::{
    http::uri::Origin,
    response::{Flash, Redirect},
    State,
};
use tracing::info;

use crate::routes::errors::ErrorPage;
use crate::utils;
use yatube_models::{cache::PageCache, users::User, Error};

/// Drops every cached page, so the next visitors see fresh content.
#[post("/admin/cache/clear")]
pub fn clear_cache(user: User, cache: &State<PageCache>) -> Result<Redirect, ErrorPage> {
    if !user.is_admin {
        return Err(Error::Forbidden.into());
    }
    cache.clear();
    info!("{} cleared the page cache", user.username);
    Ok(Redirect::to(uri!(crate::routes::posts::index(page = _))))
}

#[post("/admin/cache/clear", rank = 2)]
pub fn clear_cache_auth(origin: &Origin<'_>) -> Flash<Redirect> {
    utils::requires_login("You need to be logged in to administrate the site.", origin)
}
