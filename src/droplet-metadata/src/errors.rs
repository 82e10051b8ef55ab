// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Errors returned while fetching the droplet metadata.

use http::StatusCode;

/// The error type for a single request to the droplet metadata service.
///
/// Most applications never see this type: [fetch] logs these errors and
/// returns `None`. It is returned by [try_fetch] for callers that need to
/// distinguish the failure modes.
///
/// [fetch]: crate::client::Client::fetch
/// [try_fetch]: crate::client::Client::try_fetch
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct FetchError(ErrorKind);

impl FetchError {
    /// The connection was not established within the connect timeout.
    pub fn is_connect_timeout(&self) -> bool {
        matches!(self.0, ErrorKind::ConnectTimeout(_))
    }

    /// The service did not send (all of) the response within the read
    /// timeout.
    pub fn is_read_timeout(&self) -> bool {
        matches!(self.0, ErrorKind::ReadTimeout(_))
    }

    /// The service answered with a non-success HTTP status.
    pub fn is_bad_status(&self) -> bool {
        matches!(self.0, ErrorKind::BadStatus(_))
    }

    /// The response body is not a JSON object.
    pub fn is_malformed_payload(&self) -> bool {
        matches!(self.0, ErrorKind::MalformedPayload(_))
    }

    /// Any other transport problem, such as a refused or reset connection.
    pub fn is_transport(&self) -> bool {
        matches!(self.0, ErrorKind::Transport(_))
    }

    /// The HTTP status code, if the service answered with a non-success
    /// status.
    pub fn status(&self) -> Option<StatusCode> {
        match &self.0 {
            ErrorKind::BadStatus(code) => Some(*code),
            _ => None,
        }
    }

    /// A short name for the failure category, used in log records.
    pub fn kind(&self) -> &'static str {
        match &self.0 {
            ErrorKind::ConnectTimeout(_) => "ConnectTimeout",
            ErrorKind::ReadTimeout(_) => "ReadTimeout",
            ErrorKind::BadStatus(_) => "BadStatus",
            ErrorKind::MalformedPayload(_) => "MalformedPayload",
            ErrorKind::Transport(_) => "Transport",
        }
    }

    /// Classifies an error returned by the HTTP client.
    ///
    /// `reqwest` reports connect timeouts as both a connect and a timeout
    /// error, while read timeouts are only timeout errors.
    pub(crate) fn from_http_error(e: reqwest::Error) -> Self {
        let kind = match HttpFailure::classify(e.is_connect(), e.is_timeout()) {
            HttpFailure::ConnectTimeout => ErrorKind::ConnectTimeout(e),
            HttpFailure::ReadTimeout => ErrorKind::ReadTimeout(e),
            HttpFailure::Transport => ErrorKind::Transport(e),
        };
        Self(kind)
    }

    pub(crate) fn bad_status(code: StatusCode) -> Self {
        Self(ErrorKind::BadStatus(code))
    }

    pub(crate) fn malformed_payload(e: serde_json::Error) -> Self {
        Self(ErrorKind::MalformedPayload(e))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum HttpFailure {
    ConnectTimeout,
    ReadTimeout,
    Transport,
}

impl HttpFailure {
    fn classify(is_connect: bool, is_timeout: bool) -> Self {
        match (is_connect, is_timeout) {
            (true, true) => Self::ConnectTimeout,
            (false, true) => Self::ReadTimeout,
            _ => Self::Transport,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum ErrorKind {
    #[error("timed out connecting to the metadata service: {0}")]
    ConnectTimeout(#[source] reqwest::Error),
    #[error("timed out reading from the metadata service: {0}")]
    ReadTimeout(#[source] reqwest::Error),
    #[error("the metadata service returned HTTP status {0}")]
    BadStatus(StatusCode),
    #[error("cannot parse the metadata document: {0}")]
    MalformedPayload(#[source] serde_json::Error),
    #[error("cannot send the metadata request: {0}")]
    Transport(#[source] reqwest::Error),
}
