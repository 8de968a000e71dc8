use std::{
  sync::Mutex,
  time::Instant,
};

use serde::Serialize;

/// Per-request capture of search phases and timings.
///
/// A disabled trace never locks and never formats its detail strings, so the
/// scorer behaves identically whether tracing is on or off.
#[derive(Debug)]
pub struct SearchTrace {
  enabled: bool,
  started: Instant,
  events: Mutex<Vec<TraceEvent>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TraceEvent {
  pub phase: &'static str,
  pub detail: String,
  pub elapsed_us: u64,
}

impl SearchTrace {
  pub fn new(enabled: bool) -> SearchTrace {
    SearchTrace {
      enabled,
      started: Instant::now(),
      events: Mutex::new(Vec::new()),
    }
  }

  pub fn disabled() -> SearchTrace {
    SearchTrace::new(false)
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled
  }

  /// Append an event. The detail closure only runs when tracing is enabled.
  pub fn record(&self, phase: &'static str, detail: impl FnOnce() -> String) {
    if !self.enabled {
      return;
    }

    let event = TraceEvent {
      phase,
      detail: detail(),
      elapsed_us: self.started.elapsed().as_micros() as u64,
    };

    if let Ok(mut events) = self.events.lock() {
      events.push(event);
    }
  }

  /// Consume the trace, returning events when enabled.
  pub fn into_events(self) -> Option<Vec<TraceEvent>> {
    if !self.enabled {
      return None;
    }

    Some(self.events.into_inner().unwrap_or_default())
  }
}
