#[macro_use]
extern crate rocket;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;

use rocket::{figment::Figment, Build, Rocket};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use yatube_models::{
    cache::PageCache,
    db_conn::{init_pool, DbPool},
    migrations::run_pending_migrations,
    pagination::Paginator,
    CONFIG,
};

#[macro_use]
mod template_utils;
mod routes;
mod utils;

/// Builds the application, with its routes and shared state.
fn init_rocket(
    figment: Figment,
    pool: DbPool,
    paginator: Paginator,
    cache: PageCache,
    media: PathBuf,
) -> Rocket<Build> {
    rocket::custom(figment)
        .mount(
            "/",
            routes![
                routes::posts::index,
                routes::posts::group_posts,
                routes::posts::details,
                routes::posts::new,
                routes::posts::new_auth,
                routes::posts::create,
                routes::posts::create_auth,
                routes::posts::edit,
                routes::posts::edit_auth,
                routes::posts::update,
                routes::posts::update_auth,
                routes::posts::delete,
                routes::posts::delete_auth,
                routes::comments::create,
                routes::comments::create_auth,
                routes::comments::show,
                routes::comments::show_auth,
                routes::user::profile,
                routes::user::follow_index,
                routes::user::follow_index_auth,
                routes::user::follow,
                routes::user::follow_auth,
                routes::user::unfollow,
                routes::user::unfollow_auth,
                routes::session::new,
                routes::session::create,
                routes::session::delete,
                routes::admin::clear_cache,
                routes::admin::clear_cache_auth,
            ],
        )
        .register(
            "/",
            catchers![
                routes::errors::not_found,
                routes::errors::unprocessable_entity,
                routes::errors::server_error,
            ],
        )
        .manage(pool)
        .manage(paginator)
        .manage(cache)
        .manage(routes::posts::MediaDir(media))
}

#[rocket::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let figment = CONFIG
        .rocket
        .clone()
        .expect("main: invalid ROCKET_ADDRESS or ROCKET_PORT");
    let pool = init_pool(&CONFIG.database_url).expect("main: database pool initialization error");
    {
        let conn = pool.get().expect("main: couldn't get a database connection");
        run_pending_migrations(&conn).expect("main: couldn't run the migrations");
    }
    let paginator =
        Paginator::new(CONFIG.posts_per_page).expect("main: POSTS_PER_PAGE must be positive");
    let cache = PageCache::in_memory(CONFIG.index_cache_ttl);
    info!(
        "Serving {} posts per page, home page cached for {}s",
        paginator.page_size(),
        cache.ttl().as_secs()
    );

    let media = PathBuf::from(&CONFIG.media_directory);
    if let Err(e) = init_rocket(figment, pool, paginator, cache, media)
        .launch()
        .await
    {
        error!("Yatube stopped: {}", e);
    }
}

#[cfg(all(test, feature = "sqlite"))]
pub(crate) mod tests {
    use super::init_rocket;
    use chrono::{Duration, NaiveDate};
    use rocket::local::blocking::{Client, LocalResponse};
    use rocket::http::ContentType;
    use serde_json::Value;
    use std::time::Duration as StdDuration;
    use yatube_models::{
        cache::PageCache,
        db_conn::{establish, init_pool},
        groups::{Group, NewGroup},
        migrations::run_pending_migrations,
        pagination::Paginator,
        posts::{NewPost, Post},
        users::{NewUser, User},
        Connection,
    };

    /// A client for a fresh application, and a connection to its database.
    pub fn client() -> (Client, Connection) {
        let id = guid_create::GUID::rand();
        let path = std::env::temp_dir().join(format!("yatube-test-{}.sqlite", id));
        let media = std::env::temp_dir().join(format!("yatube-test-media-{}", id));
        let url = path.to_string_lossy().into_owned();
        let conn = establish(&url).unwrap();
        run_pending_migrations(&conn).unwrap();

        let rocket = init_rocket(
            rocket::Config::figment(),
            init_pool(&url).unwrap(),
            Paginator::new(10).unwrap(),
            PageCache::in_memory(StdDuration::from_secs(20)),
            media,
        );
        (Client::tracked(rocket).unwrap(), conn)
    }

    /// Creates an account whose password is "password".
    pub fn user(conn: &Connection, name: &str) -> User {
        NewUser::new_local(
            conn,
            name.to_owned(),
            String::new(),
            false,
            None,
            Some(User::hash_pass("password").unwrap()),
        )
        .unwrap()
    }

    pub fn group(conn: &Connection, title: &str, slug: &str) -> Group {
        NewGroup::create(conn, title.to_owned(), Some(slug.to_owned()), String::new()).unwrap()
    }

    /// Writes `count` posts, one minute apart.
    pub fn posts(conn: &Connection, author: &User, group: Option<&Group>, count: usize) -> Vec<Post> {
        let start = NaiveDate::from_ymd(2022, 1, 1).and_hms(12, 0, 0);
        (0..count)
            .map(|i| {
                Post::insert(
                    conn,
                    NewPost {
                        text: format!("Post {} by {}", i, author.username),
                        creation_date: start + Duration::minutes(i as i64),
                        author_id: author.id,
                        group_id: group.map(|g| g.id),
                        image: None,
                    },
                )
                .unwrap()
            })
            .collect()
    }

    /// Logs the client in, replacing any previous session.
    pub fn as_user(client: &Client, user: &User) {
        let response = client
            .post("/auth/login/")
            .header(ContentType::Form)
            .body(format!("username={}&password=password", user.username))
            .dispatch();
        assert_eq!(response.headers().get_one("Location"), Some("/"));
    }

    /// The JSON presentation context of a response
    pub fn context(response: LocalResponse<'_>) -> Value {
        serde_json::from_str(&response.into_string().unwrap()).unwrap()
    }
}
