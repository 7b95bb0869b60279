//! Counter request handler.
//!
//! Received -> Incrementing -> Success | Failed. One increment attempt per
//! request; the handler is the only place an internal error becomes a
//! status code, and no error detail reaches the client.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use counter_core::error::{report, ClientCode, CounterError};
use counter_core::protocol::response;
use counter_core::StoreError;

use crate::app_state::AppState;
use crate::counter::OP_INCREASE;

pub async fn increase_counter(State(app): State<AppState>) -> Response {
    // Dropping this future (client gone) cancels the in-flight store call.
    let result = match tokio::time::timeout(app.request_timeout(), app.counter().increase()).await {
        Ok(result) => result,
        Err(_) => Err(CounterError::StoreUnavailable {
            op: OP_INCREASE,
            source: StoreError::Timeout,
        }),
    };

    match result {
        Ok(counter) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            response::encode(counter),
        )
            .into_response(),
        Err(err) => HttpError(err).into_response(),
    }
}

/// Logs the full cause chain, answers with a bare status.
pub struct HttpError(pub CounterError);

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        tracing::error!(code = code.as_str(), error = %report(&self.0), "request failed");
        status_for(code).into_response()
    }
}

pub fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::StoreUnavailable
        | ClientCode::EncodingImpossible
        | ClientCode::BadConfig
        | ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
