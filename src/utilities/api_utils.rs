use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};

/// A 5xx answered with an HTML page, usually the tunnel in front of the server being down.
pub struct ServerError(pub StatusCode);

pub trait DetectServerError {
    fn server_error(self) -> Result<Response, ServerError>;
}

impl DetectServerError for Response {
    fn server_error(self) -> Result<Response, ServerError> {
        if self.status().is_server_error()
            && self.headers().get(CONTENT_TYPE).is_some_and(|header| {
                header.to_str().is_ok_and(|header| header.starts_with("text/html"))
            })
        {
            return Err(ServerError(self.status()));
        }

        Ok(self)
    }
}
