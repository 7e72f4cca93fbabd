use rocket::{
    form::Form,
    fs::TempFile,
    http::uri::Origin,
    response::{Flash, Redirect},
    State,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use validator::Validate;

use crate::routes::{errors::ErrorPage, RespondOrRedirect, HOME_TITLE};
use crate::template_utils::Rendered;
use crate::utils::{self, not_blank, FormErrors};
use yatube_models::{
    cache::PageCache,
    db_conn::DbConn,
    feeds::{self, FeedEntry},
    groups::Group,
    pagination::Paginator,
    posts::{NewPost, Post, PostUpdate},
    users::User,
    Connection, Error,
};

/// Directory where uploaded images are stored
pub struct MediaDir(pub PathBuf);

#[derive(Serialize)]
struct PostDetail {
    #[serde(flatten)]
    entry: FeedEntry,
    comments: Vec<CommentView>,
    count_posts: i64,
    form: CommentFormValues,
}

#[derive(Serialize)]
struct CommentView {
    #[serde(flatten)]
    comment: yatube_models::comments::Comment,
    author: User,
}

#[derive(Default, Serialize)]
struct CommentFormValues {
    text: String,
    errors: FormErrors,
}

#[derive(Serialize)]
struct PostFormPage<'a> {
    form: PostFormValues,
    is_edit: bool,
    post: Option<&'a Post>,
    groups: Vec<Group>,
}

#[derive(Default, Serialize)]
struct PostFormValues {
    text: String,
    group: Option<i32>,
    errors: FormErrors,
}

#[derive(FromForm, Validate)]
pub struct PostForm<'r> {
    #[field(default = String::new())]
    #[validate(custom = "not_blank")]
    pub text: String,
    pub group: Option<i32>,
    pub image: Option<TempFile<'r>>,
}

impl<'r> PostForm<'r> {
    /// Field errors, including the ones that need the database to be found.
    fn errors(&self, conn: &Connection) -> Result<FormErrors, Error> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => utils::form_errors(&e),
        };
        if let Some(id) = self.group {
            match Group::get(conn, id) {
                Ok(_) => {}
                Err(Error::NotFound) => errors
                    .entry("group".to_owned())
                    .or_default()
                    .push("Select a valid choice.".to_owned()),
                Err(e) => return Err(e),
            }
        }
        if let Some(image) = self.image.as_ref() {
            let is_image = image
                .content_type()
                .map_or(false, |ct| ct.top() == "image");
            if !is_image {
                errors
                    .entry("image".to_owned())
                    .or_default()
                    .push("Upload a valid image.".to_owned());
            }
        }
        Ok(errors)
    }

    /// Browsers send an empty, unnamed part when no file was chosen.
    fn drop_empty_image(&mut self) {
        self.image = self
            .image
            .take()
            .filter(|file| file.len() > 0 && file.name().is_some());
    }

    fn values(&self, errors: FormErrors) -> PostFormValues {
        PostFormValues {
            text: self.text.clone(),
            group: self.group,
            errors,
        }
    }
}

#[get("/?<page>")]
pub fn index(
    conn: DbConn,
    paginator: &State<Paginator>,
    cache: &State<PageCache>,
    origin: &Origin<'_>,
    page: Option<String>,
) -> Result<Rendered, ErrorPage> {
    let body = cache.get_or_render(&origin.to_string(), || {
        let page = feeds::home(&*conn, paginator, page.as_deref())?;
        Ok(render!(
            "posts/index.html",
            &json!({
                "title": HOME_TITLE,
                "page": page,
            })
        )?
        .into_bytes())
    })?;
    Ok(Rendered::cached(body))
}

#[get("/group/<slug>?<page>")]
pub fn group_posts(
    slug: &str,
    conn: DbConn,
    paginator: &State<Paginator>,
    page: Option<String>,
) -> Result<Rendered, ErrorPage> {
    let feed = feeds::group(&*conn, paginator, slug, page.as_deref())?;
    Ok(render!("posts/group_list.html", &feed)?)
}

#[get("/posts/<id>")]
pub fn details(id: i32, conn: DbConn) -> Result<Rendered, ErrorPage> {
    let entry = feeds::entry(&*conn, id)?;
    let comments = entry
        .post
        .get_comments(&*conn)?
        .into_iter()
        .map(|(comment, author)| CommentView { comment, author })
        .collect();
    let count_posts = entry.author.count_posts(&*conn)?;
    Ok(render!(
        "posts/post_detail.html",
        &PostDetail {
            entry,
            comments,
            count_posts,
            form: CommentFormValues::default(),
        }
    )?)
}

#[get("/create")]
pub fn new(conn: DbConn, _user: User) -> Result<Rendered, ErrorPage> {
    Ok(form_page(&*conn, PostFormValues::default(), None)?)
}

#[get("/create", rank = 2)]
pub fn new_auth(origin: &Origin<'_>) -> Flash<Redirect> {
    utils::requires_login("You need to be logged in to write a post.", origin)
}

#[post("/create", data = "<form>")]
pub async fn create(
    conn: DbConn,
    user: User,
    media: &State<MediaDir>,
    form: Form<PostForm<'_>>,
) -> Result<RespondOrRedirect, ErrorPage> {
    let mut form = form.into_inner();
    form.drop_empty_image();
    let errors = form.errors(&*conn)?;
    if !errors.is_empty() {
        return Ok(form_page(&*conn, form.values(errors), None)?.into());
    }

    let image = match form.image.as_mut() {
        Some(file) => Some(save_image(file, &media.0).await?),
        None => None,
    };
    let post = Post::insert(
        &*conn,
        NewPost::new(form.text, &user, form.group, image),
    )?;
    info!("{} published post {}", user.username, post.id);
    Ok(Redirect::to(utils::slashed(uri!(crate::routes::user::profile(
        name = &user.username,
        page = _
    ))))
    .into())
}

#[post("/create", rank = 2)]
pub fn create_auth(origin: &Origin<'_>) -> Flash<Redirect> {
    utils::requires_login("You need to be logged in to write a post.", origin)
}

#[get("/posts/<id>/edit")]
pub fn edit(id: i32, conn: DbConn, user: User) -> Result<RespondOrRedirect, ErrorPage> {
    let post = Post::get(&*conn, id)?;
    if !post.is_author(&user) {
        return Ok(Redirect::to(utils::slashed(uri!(details(id)))).into());
    }
    let values = PostFormValues {
        text: post.text.clone(),
        group: post.group_id,
        errors: FormErrors::new(),
    };
    Ok(form_page(&*conn, values, Some(&post))?.into())
}

#[get("/posts/<_>/edit", rank = 2)]
pub fn edit_auth(origin: &Origin<'_>) -> Flash<Redirect> {
    utils::requires_login("You need to be logged in to edit a post.", origin)
}

#[post("/posts/<id>/edit", data = "<form>")]
pub async fn update(
    id: i32,
    conn: DbConn,
    user: User,
    media: &State<MediaDir>,
    form: Form<PostForm<'_>>,
) -> Result<RespondOrRedirect, ErrorPage> {
    let post = Post::get(&*conn, id)?;
    if !post.is_author(&user) {
        return Ok(Redirect::to(utils::slashed(uri!(details(id)))).into());
    }
    let mut form = form.into_inner();
    form.drop_empty_image();
    let errors = form.errors(&*conn)?;
    if !errors.is_empty() {
        return Ok(form_page(&*conn, form.values(errors), Some(&post))?.into());
    }

    let image = match form.image.as_mut() {
        Some(file) => Some(save_image(file, &media.0).await?),
        None => post.image.clone(),
    };
    post.update(
        &*conn,
        &PostUpdate {
            text: form.text,
            group_id: form.group,
            image,
        },
    )?;
    Ok(Redirect::to(utils::slashed(uri!(details(id)))).into())
}

#[post("/posts/<_>/edit", rank = 2)]
pub fn update_auth(origin: &Origin<'_>) -> Flash<Redirect> {
    utils::requires_login("You need to be logged in to edit a post.", origin)
}

#[post("/posts/<id>/delete")]
pub fn delete(id: i32, conn: DbConn, user: User) -> Result<Redirect, ErrorPage> {
    let post = Post::get(&*conn, id)?;
    if !post.is_author(&user) {
        return Ok(Redirect::to(utils::slashed(uri!(details(id)))));
    }
    post.delete(&*conn)?;
    info!("{} deleted post {}", user.username, id);
    Ok(Redirect::to(utils::slashed(uri!(crate::routes::user::profile(
        name = &user.username,
        page = _
    )))))
}

#[post("/posts/<_>/delete", rank = 2)]
pub fn delete_auth(origin: &Origin<'_>) -> Flash<Redirect> {
    utils::requires_login("You need to be logged in to delete a post.", origin)
}

fn form_page(
    conn: &Connection,
    form: PostFormValues,
    post: Option<&Post>,
) -> Result<Rendered, Error> {
    render!(
        "posts/create_post.html",
        &PostFormPage {
            form,
            is_edit: post.is_some(),
            post,
            groups: Group::list(conn)?,
        }
    )
}

/// Copies an upload to `<media>/posts/`, returning its path relative to the media directory.
async fn save_image(file: &mut TempFile<'_>, media: &Path) -> Result<String, Error> {
    let extension = file
        .content_type()
        .and_then(|ct| ct.extension())
        .map(|ext| ext.as_str().to_owned())
        .unwrap_or_else(|| "img".to_owned());
    let stem = file.name().unwrap_or("image").to_owned();
    let dir = media.join("posts");
    rocket::tokio::fs::create_dir_all(&dir).await?;

    let mut name = format!("{}.{}", stem, extension);
    if dir.join(&name).exists() {
        name = format!("{}_{}.{}", stem, guid_create::GUID::rand(), extension);
    }
    file.copy_to(dir.join(&name)).await.map_err(|e| {
        warn!("Couldn't store uploaded image {}: {}", name, e);
        Error::from(e)
    })?;
    Ok(format!("posts/{}", name))
}
