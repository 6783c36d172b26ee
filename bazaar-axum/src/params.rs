//! Turning an HTTP request into a core navigation request.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::Form;
use axum::http::{header, HeaderMap, Method as HttpMethod, Uri};
use bazaar_core::errors::BazaarError;
use bazaar_core::{KeyValueStore, Method, Request};
use serde_json::json;

use crate::SESSION_COOKIE;

pub fn core_method(method: &HttpMethod) -> anyhow::Result<Method> {
    match *method {
        HttpMethod::GET => Ok(Method::Get),
        HttpMethod::POST => Ok(Method::Post),
        _ => Err(BazaarError::method_not_allowed(format!("Method {method} is not supported")).into_anyhow()),
    }
}

/// Value of the storage cookie, if the browser sent one.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

fn map_form_rejection(rejection: FormRejection) -> anyhow::Error {
    BazaarError::bad_request("Failed to parse the submitted form")
        .with_data(json!({"_form": [rejection.body_text()]}))
        .into_anyhow()
}

/// Form fields come from the query string for GET and the urlencoded body
/// for POST (axum's `Form` already makes that distinction).
pub fn request_from_parts(
    method: Method,
    uri: &Uri,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
    storage: Arc<dyn KeyValueStore>,
) -> anyhow::Result<Request> {
    let Form(fields) = form.map_err(map_form_rejection)?;
    Ok(Request::new(method, uri.path(), storage).with_form(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_the_storage_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; bazaar_sid=abc123; lang=bg"),
        );
        assert_eq!(session_id(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn no_cookie_means_no_id() {
        assert_eq!(session_id(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("bazaar_sid="));
        assert_eq!(session_id(&headers), None);
    }

    #[test]
    fn only_get_and_post_navigate() {
        assert_eq!(core_method(&HttpMethod::GET).unwrap(), Method::Get);
        assert_eq!(core_method(&HttpMethod::POST).unwrap(), Method::Post);

        let err = core_method(&HttpMethod::DELETE).unwrap_err();
        assert_eq!(bazaar_core::ErrorKind::of(&err), bazaar_core::ErrorKind::MethodNotAllowed);
    }
}
