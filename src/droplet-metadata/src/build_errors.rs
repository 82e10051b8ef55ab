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

//! Errors created during client construction.

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type for the metadata [Client] builder.
///
/// [Client]: crate::client::Client
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    /// The endpoint override is not a valid `http` or `https` URL.
    pub fn is_endpoint(&self) -> bool {
        matches!(self.0, ErrorKind::Endpoint(_))
    }

    /// The HTTP client could not be initialized.
    pub fn is_transport(&self) -> bool {
        matches!(self.0, ErrorKind::Transport(_))
    }

    pub(crate) fn endpoint<T>(source: T) -> Error
    where
        T: Into<BoxError>,
    {
        Error(ErrorKind::Endpoint(source.into()))
    }

    pub(crate) fn transport<T>(source: T) -> Error
    where
        T: Into<BoxError>,
    {
        Error(ErrorKind::Transport(source.into()))
    }
}

#[derive(thiserror::Error, Debug)]
enum ErrorKind {
    #[error("invalid metadata service endpoint {0}")]
    Endpoint(#[source] BoxError),
    #[error("cannot initialize the HTTP client {0}")]
    Transport(#[source] BoxError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn constructors() {
        let error = Error::endpoint("test message");
        assert!(error.is_endpoint(), "{error:?}");
        assert!(!error.is_transport(), "{error:?}");
        assert!(error.source().is_some(), "{error:?}");
        assert!(error.to_string().contains("test message"), "{error}");

        let error = Error::transport("test message");
        assert!(error.is_transport(), "{error:?}");
        assert!(!error.is_endpoint(), "{error:?}");
        assert!(error.source().is_some(), "{error:?}");
        assert!(error.to_string().contains("test message"), "{error}");
    }
}
