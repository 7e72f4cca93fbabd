use rocket::{
    http::{uri::Origin, RawStr},
    response::{Flash, Redirect},
};
use std::collections::BTreeMap;
use validator::{ValidationError, ValidationErrors};

/// Field name → messages, the way forms show their errors
pub type FormErrors = BTreeMap<String, Vec<String>>;

/// Sends a guest to the login page, remembering where they wanted to go.
pub fn requires_login(message: &str, origin: &Origin<'_>) -> Flash<Redirect> {
    Flash::warning(Redirect::to(login_url(origin)), message)
}

/// The login page, with `origin` as its percent-encoded `next` parameter
pub fn login_url(origin: &Origin<'_>) -> String {
    format!(
        "/auth/login/?next={}",
        RawStr::new(&origin.to_string()).percent_encode()
    )
}

/// Routes are declared without their trailing slash, the links they are
/// reached by keep it.
pub fn slashed(uri: Origin<'_>) -> String {
    let uri = uri.to_string();
    if uri.ends_with('/') {
        uri
    } else {
        format!("{}/", uri)
    }
}

/// Only local paths are accepted as a place to go back to after logging in.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") =>
        {
            path
        }
        _ => "/",
    }
}

pub fn form_errors(errors: &ValidationErrors) -> FormErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            (
                field.to_owned(),
                errors.iter().map(error_message).collect(),
            )
        })
        .collect()
}

fn error_message(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}

/// Validator for fields that must contain something else than whitespace
pub fn not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("This field is required.".into());
        Err(error)
    } else {
        Ok(())
    }
}
