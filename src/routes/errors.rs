use crate::template_utils::Rendered;
use rocket::{
    http::Status,
    response::{self, Responder},
    Request,
};
use tracing::{error, warn};
use yatube_models::Error;

#[derive(Debug)]
pub struct ErrorPage(pub Error);

impl From<Error> for ErrorPage {
    fn from(err: Error) -> ErrorPage {
        ErrorPage(err)
    }
}

impl ErrorPage {
    pub fn status(&self) -> Status {
        match self.0 {
            Error::NotFound => Status::NotFound,
            Error::Unauthorized => Status::Unauthorized,
            Error::Forbidden => Status::Forbidden,
            _ => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for ErrorPage {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status == Status::InternalServerError {
            error!("{} {}: {:?}", req.method(), req.uri(), self.0);
        } else {
            warn!("{} {}: {:?}", req.method(), req.uri(), self.0);
        }
        (status, error_page(status, req)).respond_to(req)
    }
}

fn error_page(status: Status, req: &Request<'_>) -> Rendered {
    let template = match status.code {
        401 => "core/401.html",
        403 => "core/403.html",
        404 => "core/404.html",
        _ => "core/500.html",
    };
    Rendered::from_value(
        template,
        json!({
            "path": req.uri().path().to_string(),
            "status": status.code,
        }),
    )
}

#[catch(404)]
pub fn not_found(req: &Request<'_>) -> Rendered {
    error_page(Status::NotFound, req)
}

/// Path segments that don't parse, like `/posts/abc/`, are unknown pages.
#[catch(422)]
pub fn unprocessable_entity(req: &Request<'_>) -> (Status, Rendered) {
    (Status::NotFound, error_page(Status::NotFound, req))
}

#[catch(500)]
pub fn server_error(req: &Request<'_>) -> Rendered {
    error_page(Status::InternalServerError, req)
}
