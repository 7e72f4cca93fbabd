use rocket::http::{ContentType, Method, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use serde::Serialize;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::sync::Arc;
use yatube_models::Result;

/// A presentation context: the name of a template and the data to fill it with,
/// serialized as JSON.
#[derive(Clone, Debug)]
pub struct Rendered {
    body: Vec<u8>,
    has_form: bool,
}

impl Rendered {
    pub fn new<C: Serialize>(template: &str, context: &C) -> Result<Rendered> {
        Ok(Rendered::from_value(template, serde_json::to_value(context)?))
    }

    pub fn from_value(template: &str, context: Value) -> Rendered {
        let has_form = context.get("form").is_some();
        let body = json!({
            "template": template,
            "context": context,
        })
        .to_string()
        .into_bytes();
        Rendered { body, has_form }
    }

    /// A page that was rendered earlier and kept in the page cache
    pub fn cached(body: Arc<Vec<u8>>) -> Rendered {
        Rendered {
            body: body.as_ref().clone(),
            has_form: false,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}

impl<'r> Responder<'r, 'static> for Rendered {
    fn respond_to(self, r: &'r Request<'_>) -> response::Result<'static> {
        //if method is not Get or page contain a form, no caching
        if r.method() != Method::Get || self.has_form {
            return (ContentType::JSON, self.body).respond_to(r);
        }
        let mut hasher = DefaultHasher::new();
        hasher.write(&self.body);
        let etag = format!("{:x}", hasher.finish());
        if r
            .headers()
            .get("If-None-Match")
            .any(|s| s.trim_matches('"') == etag)
        {
            Response::build()
                .status(Status::NotModified)
                .raw_header("ETag", format!("\"{}\"", etag))
                .ok()
        } else {
            Response::build()
                .merge((ContentType::JSON, self.body).respond_to(r)?)
                .raw_header("ETag", format!("\"{}\"", etag))
                .ok()
        }
    }
}

#[macro_export]
macro_rules! render {
    ($template:expr, $context:expr) => {
        crate::template_utils::Rendered::new($template, $context)
    };
}
