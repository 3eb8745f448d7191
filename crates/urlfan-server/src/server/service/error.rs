use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Failure reported to an HTTP client.
///
/// Engine errors pass through unchanged; the transport adds the two failures
/// that only exist at this layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Fetch(#[from] urlfan_core::Error),

    /// The body was not a JSON array of strings.
    #[error("Json is not valid")]
    MalformedJson,

    /// The whole request exceeded the configured request timeout.
    #[error("Timeout error")]
    Timeout,
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        use urlfan_core::Error;

        match self {
            Self::Fetch(Error::InvalidRequest { .. }) | Self::MalformedJson => {
                StatusCode::BAD_REQUEST
            }
            Self::Fetch(Error::TooManyRequests { .. }) => StatusCode::TOO_MANY_REQUESTS,
            Self::Fetch(Error::ServiceShutdown) | Self::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            Self::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            format!("An error occurred while executing the request: {self}")
        } else {
            self.to_string()
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urlfan_core::Error;

    #[test]
    fn maps_engine_errors_to_status_codes() {
        let cases = [
            (
                ApiError::from(Error::InvalidRequest {
                    reason: "Request is empty".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::MalformedJson, StatusCode::BAD_REQUEST),
            (
                ApiError::from(Error::TooManyRequests { capacity: 100 }),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (ApiError::from(Error::ServiceShutdown), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::Timeout, StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::from(Error::Cancelled), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::from(Error::BadResponse {
                    url: "http://a.test/".to_string(),
                    status: 404,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }

    #[test]
    fn validation_message_is_passed_through() {
        let err = ApiError::from(Error::InvalidRequest {
            reason: "Got invalid url: nope".to_string(),
        });
        assert_eq!(err.to_string(), "Got invalid url: nope");
    }
}
