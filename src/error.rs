use crate::actions_response::FormError;
use crate::config::ConfigError;
use crate::data::{ApiError, SessionError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("malformed form: {0}")]
    MalformedPayload(#[from] FormError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("session store unavailable: {0}")]
    Mailbox(#[from] actix::MailboxError),

    #[error("background task failed: {0}")]
    Join(#[from] actix_rt::task::JoinError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot render page: {0}")]
    Render(#[from] tera::Error),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Session(_) => StatusCode::NOT_FOUND,
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        let message = match self {
            AppError::Session(_) => {
                "This page has expired. Start again from the home page.".to_owned()
            }
            AppError::MalformedPayload(e) => e.to_string(),
            _ => "Something went wrong.".to_owned(),
        };
        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(message)
    }
}
