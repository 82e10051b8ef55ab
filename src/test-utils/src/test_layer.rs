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

use std::collections::HashMap;
use std::sync::{Mutex, Once};
use tracing::{Event, Level, Subscriber, field, span};
use tracing_subscriber::registry::{LookupSpan, SpanRef};
use tracing_subscriber::{self, Layer, layer::Context, prelude::*};

const TEST_LAYER_SPAN: &str = "test_layer";

/// A log event captured by the [TestLayer].
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    /// The event level.
    pub level: Level,
    /// The event target, usually the module path that emitted it.
    pub target: String,
    /// The event fields, including the formatted `message`.
    pub fields: HashMap<String, String>,
    /// The test ID associated with this event.
    pub test_id: Option<String>,
}

impl CapturedEvent {
    /// The formatted message, if any.
    pub fn message(&self) -> Option<&str> {
        self.field("message")
    }

    /// The string representation of a field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Converts the event (or span) fields to strings.
struct TestVisitor<'a>(&'a mut HashMap<String, String>);

impl<'a> field::Visit for TestVisitor<'a> {
    fn record_str(&mut self, field: &field::Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &field::Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_i64(&mut self, field: &field::Field, value: i64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &field::Field, value: u64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_bool(&mut self, field: &field::Field, value: bool) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

/// The events captured by the global `TestLayer`.
struct CapturedEventLog {
    events: Mutex<Vec<CapturedEvent>>,
}

impl CapturedEventLog {
    const fn new() -> Self {
        CapturedEventLog {
            events: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, event: CapturedEvent) {
        self.events.lock().unwrap().push(event);
    }

    /// Retrieves and removes all events associated with `test_id`.
    fn take_by_test_id(&self, test_id: &str) -> Vec<CapturedEvent> {
        let mut events = self.events.lock().unwrap();
        let (taken, kept): (Vec<_>, Vec<_>) = events
            .drain(..)
            .partition(|e| e.test_id.as_deref() == Some(test_id));
        *events = kept;
        taken
    }

    fn clear_by_test_id(&self, test_id: &str) {
        self.events
            .lock()
            .unwrap()
            .retain(|e| e.test_id.as_deref() != Some(test_id));
    }
}

static EVENT_LOG: CapturedEventLog = CapturedEventLog::new();
static INIT: Once = Once::new();

/// Stores the test ID in the extensions of the `test_layer` span.
#[derive(Clone, Debug)]
struct TestId(String);

/// Finds the test ID by walking up to the enclosing `test_layer` span.
fn find_test_id<S>(span_ref: Option<SpanRef<'_, S>>) -> Option<String>
where
    S: Subscriber + for<'b> LookupSpan<'b>,
{
    let span = span_ref?.scope().find(|s| s.name() == TEST_LAYER_SPAN)?;
    let extensions = span.extensions();
    extensions.get::<TestId>().map(|t| t.0.clone())
}

/// A tracing layer to capture and inspect log events in tests.
///
/// The layer is installed as the global subscriber. Events are isolated by
/// a `test_id`, so tests can run in parallel. Each test:
///
/// 1. Calls `TestLayer::initialize()` with a unique `TEST_ID` and keeps the
///    returned guard in scope.
/// 2. Runs the code under test. On the current-thread runtime used by
///    `#[tokio::test]` the guard stays entered across `.await` points.
/// 3. Calls `TestLayer::capture()` with the same `TEST_ID`.
///
/// # Example
///
/// ```rust
/// use droplet_metadata_test_utils::test_layer::*;
///
/// const TEST_ID: &str = "my_logging_test";
/// let _guard = TestLayer::initialize(TEST_ID);
/// tracing::warn!(url = "http://localhost", "request failed");
///
/// let captured = TestLayer::capture(TEST_ID);
/// assert_eq!(captured.len(), 1);
/// assert_eq!(captured[0].level, tracing::Level::WARN);
/// assert_eq!(captured[0].field("url"), Some("http://localhost"));
/// assert_eq!(captured[0].message(), Some("request failed"));
/// ```
#[derive(Clone, Default)]
pub struct TestLayer;

impl TestLayer {
    /// Initializes the `TestLayer` for the current test scope.
    ///
    /// Installs the global subscriber on first use, and clears any events
    /// previously captured for `test_id`. Events are captured only while the
    /// returned guard is in scope.
    pub fn initialize(test_id: &'static str) -> tracing::span::EnteredSpan {
        INIT.call_once(|| {
            let subscriber = tracing_subscriber::registry().with(TestLayer);
            tracing::subscriber::set_global_default(subscriber)
                .expect("Failed to set global default subscriber");
        });
        EVENT_LOG.clear_by_test_id(test_id);
        tracing::span!(Level::INFO, TEST_LAYER_SPAN, test_id = test_id).entered()
    }

    /// Retrieves, and removes, all events captured for `test_id`.
    pub fn capture(test_id: &str) -> Vec<CapturedEvent> {
        EVENT_LOG.take_by_test_id(test_id)
    }

    /// Like [capture](TestLayer::capture), keeping only events whose target
    /// starts with `target_prefix`.
    ///
    /// Dependencies (e.g. the HTTP client) emit their own events inside the
    /// test scope. Use this to assert on the events of a single crate.
    pub fn capture_target(test_id: &str, target_prefix: &str) -> Vec<CapturedEvent> {
        Self::capture(test_id)
            .into_iter()
            .filter(|e| e.target.starts_with(target_prefix))
            .collect()
    }
}

impl<S> Layer<S> for TestLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    /// Tags the `test_layer` spans with their test ID.
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if attrs.metadata().name() != TEST_LAYER_SPAN {
            return;
        }
        let mut fields = HashMap::new();
        attrs.record(&mut TestVisitor(&mut fields));
        if let (Some(span_ref), Some(test_id)) = (ctx.span(id), fields.remove("test_id")) {
            span_ref.extensions_mut().insert(TestId(test_id));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(test_id) = find_test_id(ctx.event_span(event)) else {
            return;
        };
        let mut fields = HashMap::new();
        event.record(&mut TestVisitor(&mut fields));
        EVENT_LOG.push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields,
            test_id: Some(test_id),
        });
    }
}
