use rocket::{
    form::Form,
    http::{Cookie, CookieJar},
    request::FlashMessage,
    response::Redirect,
};
use tracing::{info, warn};
use validator::Validate;

use crate::routes::{errors::ErrorPage, RespondOrRedirect};
use crate::template_utils::Rendered;
use crate::utils::{self, not_blank, FormErrors};
use yatube_models::{
    db_conn::DbConn,
    users::{User, AUTH_COOKIE},
    Error,
};

#[derive(Default, FromForm, Validate)]
pub struct LoginForm {
    #[field(default = String::new())]
    #[validate(custom = "not_blank")]
    pub username: String,
    #[field(default = String::new())]
    #[validate(custom = "not_blank")]
    pub password: String,
    pub next: Option<String>,
}

#[get("/auth/login?<next>")]
pub fn new(user: Option<User>, next: Option<String>, flash: Option<FlashMessage<'_>>) -> Rendered {
    login_page(
        &LoginForm {
            next,
            ..LoginForm::default()
        },
        FormErrors::new(),
        user,
        flash.map(|f| f.message().to_owned()),
    )
}

#[post("/auth/login", data = "<form>")]
pub fn create(
    conn: DbConn,
    form: Form<LoginForm>,
    cookies: &CookieJar<'_>,
) -> Result<RespondOrRedirect, ErrorPage> {
    if let Err(e) = form.validate() {
        return Ok(RespondOrRedirect::Response(login_page(
            &form,
            utils::form_errors(&e),
            None,
            None,
        )));
    }

    let user = match User::login(&*conn, &form.username, &form.password) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            warn!("Failed login attempt for {:?}", form.username);
            let mut errors = FormErrors::new();
            errors.insert(
                "__all__".to_owned(),
                vec!["Please enter a correct username and password.".to_owned()],
            );
            return Ok(RespondOrRedirect::Response(login_page(&form, errors, None, None)));
        }
        Err(e) => return Err(e.into()),
    };

    cookies.add_private(Cookie::new(AUTH_COOKIE, user.id.to_string()));
    info!("{} logged in", user.username);
    Ok(Redirect::to(utils::safe_next(form.next.as_deref()).to_owned()).into())
}

#[get("/auth/logout")]
pub fn delete(cookies: &CookieJar<'_>) -> Redirect {
    cookies.remove_private(AUTH_COOKIE);
    Redirect::to(uri!(crate::routes::posts::index(page = _)))
}

fn login_page(
    form: &LoginForm,
    errors: FormErrors,
    account: Option<User>,
    message: Option<String>,
) -> Rendered {
    Rendered::from_value(
        "users/login.html",
        json!({
            "form": {
                "username": form.username,
                "next": form.next,
                "errors": errors,
            },
            "account": account,
            "message": message,
        }),
    )
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use crate::tests::{as_user, client, context, user};
    use rocket::http::{ContentType, Status};

    #[test]
    fn login_and_logout() {
        let (client, conn) = client();
        let leo = user(&conn, "leo");

        let page = context(client.get("/auth/login/?next=/create/").dispatch());
        assert_eq!(page["template"], "users/login.html");
        assert_eq!(page["context"]["form"]["next"], "/create/");

        let response = client
            .post("/auth/login/")
            .header(ContentType::Form)
            .body("username=leo&password=wrong")
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let page = context(response);
        assert_eq!(
            page["context"]["form"]["errors"]["__all__"][0],
            "Please enter a correct username and password."
        );
        assert!(page["context"]["form"].get("password").is_none());

        let response = client
            .post("/auth/login/")
            .header(ContentType::Form)
            .body("username=leo&password=password&next=/create/")
            .dispatch();
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/create/"));
        assert_eq!(client.get("/create/").dispatch().status(), Status::Ok);

        let response = client.get("/auth/logout/").dispatch();
        assert_eq!(response.headers().get_one("Location"), Some("/"));
        assert_eq!(client.get("/create/").dispatch().status(), Status::SeeOther);

        as_user(&client, &leo);
        assert_eq!(client.get("/create/").dispatch().status(), Status::Ok);
    }

    #[test]
    fn next_must_be_local() {
        let (client, conn) = client();
        user(&conn, "leo");

        let response = client
            .post("/auth/login/")
            .header(ContentType::Form)
            .body("username=leo&password=password&next=https://example.com/")
            .dispatch();
        assert_eq!(response.headers().get_one("Location"), Some("/"));

        let response = client
            .post("/auth/login/")
            .header(ContentType::Form)
            .body("username=leo&password=password&next=%2F%5Cevil.example")
            .dispatch();
        assert_eq!(response.headers().get_one("Location"), Some("/"));
    }

    #[test]
    fn back_where_the_guest_started() {
        let (client, conn) = client();
        user(&conn, "leo");

        let response = client.get("/follow/?page=2").dispatch();
        let login = response.headers().get_one("Location").unwrap().to_owned();
        let page = context(client.get(login).dispatch());
        assert_eq!(page["context"]["form"]["next"], "/follow/?page=2");

        let response = client
            .post("/auth/login/")
            .header(ContentType::Form)
            .body("username=leo&password=password&next=%2Ffollow%2F%3Fpage%3D2")
            .dispatch();
        assert_eq!(response.headers().get_one("Location"), Some("/follow/?page=2"));
        assert_eq!(client.get("/follow/?page=2").dispatch().status(), Status::Ok);
    }

    #[test]
    fn blank_fields() {
        let (client, _conn) = client();
        let page = context(
            client
                .post("/auth/login/")
                .header(ContentType::Form)
                .body("username=&password=")
                .dispatch(),
        );
        assert_eq!(page["context"]["form"]["errors"]["username"][0], "This field is required.");
        assert_eq!(page["context"]["form"]["errors"]["password"][0], "This field is required.");
    }
}
