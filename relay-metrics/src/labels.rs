//! Label value normalization

use relay_http_client::{Method, StatusCode};

/// Lowercase an HTTP method for use as a label value.
///
/// ```
/// use relay_metrics::sanitize_method;
/// use relay_http_client::Method;
///
/// assert_eq!(sanitize_method(&Method::GET), "get");
/// ```
pub fn sanitize_method(method: &Method) -> String {
    match *method {
        Method::GET => "get".to_string(),
        Method::PUT => "put".to_string(),
        Method::HEAD => "head".to_string(),
        Method::POST => "post".to_string(),
        Method::DELETE => "delete".to_string(),
        Method::CONNECT => "connect".to_string(),
        Method::OPTIONS => "options".to_string(),
        _ => method.as_str().to_lowercase(),
    }
}

/// Render a status code as a label value.
pub fn sanitize_code(status: StatusCode) -> String {
    status.as_u16().to_string()
}
