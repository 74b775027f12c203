//! The decode pipeline: decode, rewrite, return.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::adblock;
use crate::config::{ConfigReader, Settings};
use crate::dearrow::{self, DeArrow};
use crate::error::{panic_message, Error, Result};
use crate::guard::ProcessedGuard;
use crate::injections::{self, HostState, NoHostState};
use crate::json;
use crate::location::{ContextTracker, Location, LocationSource, PageContext};
use crate::passes::PassContext;
use crate::shelves;

const GUARD_CAPACITY: usize = 64;

/// A deserializer the pipeline wraps.
pub trait Decode: Send + Sync {
    fn decode(&self, raw: &str) -> Result<Value>;
}

/// Plain `serde_json` decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decode for JsonDecoder {
    fn decode(&self, raw: &str) -> Result<Value> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// A rewritten payload together with the generation its DeArrow results are
/// filed under.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub payload: Value,
    pub generation: u64,
}

/// Decoder wrapper applying the rewrite pipeline to every successful decode.
/// Clones share state, so every host context can hold the same instance.
#[derive(Clone)]
pub struct Reshelf {
    inner: Arc<Inner>,
}

struct Inner {
    decoder: Box<dyn Decode>,
    config: Arc<dyn ConfigReader>,
    location: Arc<dyn LocationSource>,
    host: Arc<dyn HostState>,
    dearrow: Option<DeArrow>,
    tracker: ContextTracker,
    generation: AtomicU64,
}

pub struct ReshelfBuilder {
    decoder: Box<dyn Decode>,
    config: Arc<dyn ConfigReader>,
    location: Arc<dyn LocationSource>,
    host: Arc<dyn HostState>,
    dearrow: Option<DeArrow>,
}

impl Default for ReshelfBuilder {
    fn default() -> Self {
        Self {
            decoder: Box::new(JsonDecoder),
            config: Arc::new(Settings::default()),
            location: Arc::new(Location::default()),
            host: Arc::new(NoHostState),
            dearrow: None,
        }
    }
}

impl ReshelfBuilder {
    pub fn decoder(mut self, decoder: impl Decode + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    pub fn config(mut self, config: Arc<dyn ConfigReader>) -> Self {
        self.config = config;
        self
    }

    pub fn location(mut self, location: Arc<dyn LocationSource>) -> Self {
        self.location = location;
        self
    }

    pub fn host_state(mut self, host: Arc<dyn HostState>) -> Self {
        self.host = host;
        self
    }

    /// Enable background DeArrow fetching. Without it the pass is skipped.
    pub fn dearrow(mut self, dearrow: DeArrow) -> Self {
        self.dearrow = Some(dearrow);
        self
    }

    pub fn build(self) -> Reshelf {
        Reshelf {
            inner: Arc::new(Inner {
                decoder: self.decoder,
                config: self.config,
                location: self.location,
                host: self.host,
                dearrow: self.dearrow,
                tracker: ContextTracker::default(),
                generation: AtomicU64::new(0),
            }),
        }
    }
}

impl Reshelf {
    pub fn builder() -> ReshelfBuilder {
        ReshelfBuilder::default()
    }

    /// Drop-in replacement for the wrapped decoder.
    pub fn decode(&self, raw: &str) -> Result<Value> {
        self.decode_tracked(raw).map(|d| d.payload)
    }

    /// Decode and rewrite, keeping the generation so late DeArrow results can
    /// be applied with [`Reshelf::apply_substitutions`].
    pub fn decode_tracked(&self, raw: &str) -> Result<Decoded> {
        let payload = self.inner.decoder.decode(raw)?;
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        Ok(Decoded { payload: self.rewrite(payload, generation), generation })
    }

    /// Run the pipeline over an already decoded payload. On any failure the
    /// payload is returned exactly as it came in.
    pub fn rewrite(&self, payload: Value, generation: u64) -> Value {
        let original = payload.clone();
        let mut working = payload;
        match catch_unwind(AssertUnwindSafe(|| self.run(&mut working, generation))) {
            Ok(()) => working,
            Err(panic) => {
                let err = Error::rewrite("pipeline", panic_message(panic.as_ref()));
                warn!(generation, error = %err, "returning original payload");
                original
            }
        }
    }

    /// Apply the DeArrow results that arrived for `decoded` so far.
    pub fn apply_substitutions(&self, decoded: &mut Decoded) -> usize {
        let Some(dearrow) = &self.inner.dearrow else {
            return 0;
        };
        let subs = dearrow.queue().take(decoded.generation);
        dearrow::apply_substitutions(&mut decoded.payload, &subs)
    }

    /// Context seen by the most recent rewrite.
    pub fn last_context(&self) -> Option<PageContext> {
        self.inner.tracker.last()
    }

    fn run(&self, payload: &mut Value, generation: u64) {
        let inner = &self.inner;
        let settings = inner.config.settings();
        let page = inner.tracker.observe(&inner.location.location());

        let stripped = adblock::strip(payload, &settings);

        let ctx = PassContext { settings: &settings, page, generation, dearrow: inner.dearrow.as_ref() };
        let pivot_prefix = if json::get(payload, shelves::WATCH_NEXT_PIVOT).is_some() {
            injections::queue_shelf(&inner.host.queued_videos())
        } else {
            None
        };
        // One guard per payload.
        let guard = ProcessedGuard::with_capacity(GUARD_CAPACITY);
        let collections = shelves::walk(payload, &ctx, &guard, pivot_prefix);
        injections::inject_player(payload, &settings, inner.host.as_ref());

        debug!(generation, %page, stripped, collections, "payload rewritten");
    }
}
