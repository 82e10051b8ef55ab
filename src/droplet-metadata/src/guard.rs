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

use serde_json::{Map, Value};

const MANUFACTURER_KEY: &str = "manufacturer";
const DIGITALOCEAN_MANUFACTURER: &str = "digitalocean";

/// The system (DMI) descriptor collected by the host's fact framework.
///
/// Only the `manufacturer` entry is consulted. The framework owns the value;
/// this crate never collects it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SystemDescriptor(Map<String, Value>);

impl SystemDescriptor {
    /// Wraps a descriptor collected by the host framework.
    pub fn new(entries: Map<String, Value>) -> Self {
        Self(entries)
    }

    /// The DMI manufacturer, if present and a string.
    pub fn manufacturer(&self) -> Option<&str> {
        self.0.get(MANUFACTURER_KEY).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for SystemDescriptor {
    fn from(entries: Map<String, Value>) -> Self {
        Self::new(entries)
    }
}

impl<K, V> FromIterator<(K, V)> for SystemDescriptor
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Returns `true` if the host is plausibly a DigitalOcean droplet.
///
/// A missing descriptor, a missing `manufacturer`, or a `manufacturer` that
/// is not a string all return `false`. The check never performs I/O.
pub fn should_fetch(descriptor: Option<&SystemDescriptor>) -> bool {
    descriptor
        .and_then(SystemDescriptor::manufacturer)
        .is_some_and(|m| m.eq_ignore_ascii_case(DIGITALOCEAN_MANUFACTURER))
}
