use crate::template_utils::Rendered;
use rocket::response::{Flash, Redirect};

/// Title of the home page
pub const HOME_TITLE: &str = "Latest updates on Yatube";

/// Responses of handlers that either show a page or send the user elsewhere
#[derive(Responder)]
pub enum RespondOrRedirect {
    Response(Rendered),
    Redirect(Redirect),
    FlashRedirect(Flash<Redirect>),
}

impl From<Rendered> for RespondOrRedirect {
    fn from(page: Rendered) -> Self {
        RespondOrRedirect::Response(page)
    }
}

impl From<Redirect> for RespondOrRedirect {
    fn from(redirect: Redirect) -> Self {
        RespondOrRedirect::Redirect(redirect)
    }
}

impl From<Flash<Redirect>> for RespondOrRedirect {
    fn from(redirect: Flash<Redirect>) -> Self {
        RespondOrRedirect::FlashRedirect(redirect)
    }
}

pub mod admin;
pub mod comments;
pub mod errors;
pub mod posts;
pub mod session;
pub mod user;
