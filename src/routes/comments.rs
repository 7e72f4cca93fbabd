use rocket::{
    form::Form,
    http::uri::Origin,
    response::{Flash, Redirect},
};
use tracing::debug;
use validator::Validate;

use crate::routes::errors::ErrorPage;
use crate::utils::{self, not_blank};
use yatube_models::{
    comments::{Comment, NewComment},
    db_conn::DbConn,
    posts::Post,
    users::User,
};

#[derive(FromForm, Validate)]
pub struct CommentForm {
    #[field(default = String::new())]
    #[validate(custom = "not_blank")]
    pub text: String,
}

/// Invalid comments are dropped, the user always lands back on the post.
#[post("/posts/<id>/comment", data = "<form>")]
pub fn create(
    id: i32,
    conn: DbConn,
    user: User,
    form: Form<CommentForm>,
) -> Result<Redirect, ErrorPage> {
    let post = Post::get(&*conn, id)?;
    if form.validate().is_ok() {
        let comment = Comment::insert(
            &*conn,
            NewComment::new(&post, &user, form.into_inner().text),
        )?;
        debug!("{} commented on post {}: {}", user.username, post.id, comment.id);
    }
    Ok(Redirect::to(utils::slashed(uri!(crate::routes::posts::details(id)))))
}

#[get("/posts/<id>/comment")]
pub fn show(id: i32, conn: DbConn, _user: User) -> Result<Redirect, ErrorPage> {
    Post::get(&*conn, id)?;
    Ok(Redirect::to(utils::slashed(uri!(crate::routes::posts::details(id)))))
}

#[post("/posts/<_>/comment", rank = 2)]
pub fn create_auth(origin: &Origin<'_>) -> Flash<Redirect> {
    utils::requires_login("You need to be logged in to comment.", origin)
}

#[get("/posts/<_>/comment", rank = 2)]
pub fn show_auth(origin: &Origin<'_>) -> Flash<Redirect> {
    utils::requires_login("You need to be logged in to comment.", origin)
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use crate::tests::{as_user, client, context, posts, user};
    use rocket::http::{ContentType, Status};
    use yatube_models::comments::Comment;

    #[test]
    fn add_comment() {
        let (client, conn) = client();
        let leo = user(&conn, "leo");
        let kim = user(&conn, "kim");
        let post = posts(&conn, &leo, None, 1).remove(0);
        let path = format!("/posts/{}/comment/", post.id);

        let response = client
            .post(path.as_str())
            .header(ContentType::Form)
            .body("text=Nice")
            .dispatch();
        assert_eq!(
            response.headers().get_one("Location"),
            Some(format!("/auth/login/?next={}", path.replace('/', "%2F")).as_str())
        );
        assert_eq!(Comment::count_for_post(&conn, post.id).unwrap(), 0);

        as_user(&client, &kim);
        let response = client
            .post(path.as_str())
            .header(ContentType::Form)
            .body("text=Nice+post")
            .dispatch();
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(
            response.headers().get_one("Location"),
            Some(format!("/posts/{}/", post.id).as_str())
        );

        client
            .post(path.as_str())
            .header(ContentType::Form)
            .body("text=+")
            .dispatch();
        assert_eq!(Comment::count_for_post(&conn, post.id).unwrap(), 1);

        let detail = context(client.get(format!("/posts/{}/", post.id)).dispatch());
        assert_eq!(detail["context"]["comments"][0]["text"], "Nice post");
        assert_eq!(detail["context"]["comments"][0]["author"]["username"], "kim");

        let missing = client
            .post("/posts/4242/comment/")
            .header(ContentType::Form)
            .body("text=Hello")
            .dispatch();
        assert_eq!(missing.status(), Status::NotFound);
    }
}
