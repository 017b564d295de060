use std::{
  collections::BTreeMap,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
  },
};

use tracing::Subscriber;
use tracing_subscriber::{registry::LookupSpan, Layer};

/// Number of components that fired since the last reset.
pub static FIRED_COUNTER: AtomicUsize = AtomicUsize::new(0);

static FIRED_BY_TEMPLATE: Mutex<BTreeMap<String, usize>> = Mutex::new(BTreeMap::new());

/// Tallies the engine's "component fired" events per template.
pub struct FiringCounterLayer;

impl<S> Layer<S> for FiringCounterLayer
where S: Subscriber + for<'a> LookupSpan<'a>
{
  fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
    let mut message = String::new();
    event.record(&mut MessageVisitor(&mut message));

    // "component fired: <instance> (<template>)"
    let Some(fired) = message.strip_prefix("component fired: ") else { return };
    FIRED_COUNTER.fetch_add(1, Ordering::SeqCst);
    let template = fired
      .rsplit_once('(')
      .map(|(_, rest)| rest.trim_end_matches(')'))
      .unwrap_or(fired)
      .to_string();
    if let Ok(mut tally) = FIRED_BY_TEMPLATE.lock() {
      *tally.entry(template).or_default() += 1;
    }
  }
}

struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
  fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
    if field.name() == "message" {
      self.0.push_str(&format!("{:?}", value));
    }
  }
}

/// Components fired per template name.
pub fn fired_by_template() -> BTreeMap<String, usize> {
  FIRED_BY_TEMPLATE.lock().map(|tally| tally.clone()).unwrap_or_default()
}

pub fn reset() {
  FIRED_COUNTER.store(0, Ordering::SeqCst);
  if let Ok(mut tally) = FIRED_BY_TEMPLATE.lock() {
    tally.clear();
  }
}
