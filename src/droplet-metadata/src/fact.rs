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

use crate::MetadataDocument;
use crate::build_errors::Error as BuildError;
use crate::client::Client;
use crate::guard::{SystemDescriptor, should_fetch};

/// The name under which the fact is registered.
pub const FACT_NAME: &str = "do_metadata";

/// The `do_metadata` fact: the platform guard followed by the metadata fetch.
///
/// The host's fact framework owns scheduling and caching. It is expected to
/// hold one instance and call [resolve](DropletMetadata::resolve) at most
/// once per collection cycle.
#[derive(Clone, Debug)]
pub struct DropletMetadata {
    client: Client,
}

impl DropletMetadata {
    /// Creates the fact with a client for the default metadata endpoint.
    pub fn new() -> Result<Self, BuildError> {
        Ok(Self::with_client(Client::new()?))
    }

    /// Creates the fact with a preconfigured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// The fact name.
    pub fn name(&self) -> &'static str {
        FACT_NAME
    }

    /// Evaluates the fact.
    ///
    /// Returns `None` without touching the network if `dmi` does not identify
    /// a DigitalOcean droplet. Otherwise returns the result of
    /// [Client::fetch].
    pub async fn resolve(&self, dmi: Option<&SystemDescriptor>) -> Option<MetadataDocument> {
        if !should_fetch(dmi) {
            return None;
        }
        self.client.fetch().await
    }
}
