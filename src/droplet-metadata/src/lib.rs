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

//! DigitalOcean droplet metadata as a host fact.
//!
//! DigitalOcean droplets expose a [metadata service] on a link-local address.
//! This crate detects whether the current host is a droplet, using the DMI
//! manufacturer collected by the host's fact framework, and if so fetches the
//! droplet metadata document with a single, bounded HTTP request.
//!
//! The document is returned without the `vendor_data` and `user_data` keys.
//! These are often large (MIME-encoded cloud-init data and user scripts) and
//! are not worth storing in an inventory database.
//!
//! Collection never fails loudly: a host that is not a droplet yields no
//! value, and any failure while talking to the metadata service is logged
//! once (via [tracing]) and yields no value.
//!
//! ```no_run
//! # use droplet_metadata::fact::DropletMetadata;
//! # use droplet_metadata::guard::SystemDescriptor;
//! # tokio_test::block_on(async {
//! let dmi = SystemDescriptor::from_iter([("manufacturer", "DigitalOcean")]);
//! let fact = DropletMetadata::new()?;
//! if let Some(document) = fact.resolve(Some(&dmi)).await {
//!     println!("droplet_id = {:?}", document.get("droplet_id"));
//! }
//! # Ok::<(), droplet_metadata::build_errors::Error>(())
//! # });
//! ```
//!
//! [metadata service]: https://docs.digitalocean.com/reference/api/metadata/

pub mod build_errors;
pub mod errors;

/// Detects whether the host is a DigitalOcean droplet.
pub mod guard;

/// The client for the droplet metadata service.
pub mod client;

/// The `do_metadata` fact.
pub mod fact;

/// The droplet metadata document, after redaction.
///
/// The document is treated as opaque: any JSON object returned by the
/// metadata service is accepted, and only the redacted keys are removed.
pub type MetadataDocument = serde_json::Map<String, serde_json::Value>;

/// A `Result` alias where the `Err` case is
/// `droplet_metadata::errors::FetchError`.
pub type Result<T> = std::result::Result<T, crate::errors::FetchError>;
