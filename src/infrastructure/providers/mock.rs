//! # Mock Provider
//!
//! Configurable in-process [`ProviderClient`] for local runs, demos and
//! tests. It answers with a fixed quote, a fixed error, or a scripted
//! sequence of results, optionally after a delay.

use crate::domain::entities::{DEFAULT_CURRENCY, NO_SURGE, Quote, QuoteBuilder};
use crate::domain::value_objects::{Price, ProviderId, RouteKey, Timestamp};
use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use crate::infrastructure::providers::traits::ProviderClient;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Behavior {
    Quote {
        price: Price,
        currency: String,
        surge_multiplier: f64,
        estimate_minutes: u32,
    },
    Fail(ProviderError),
}

/// In-process provider with scripted behavior.
#[derive(Debug)]
pub struct MockProvider {
    id: ProviderId,
    behavior: Behavior,
    script: Mutex<VecDeque<ProviderResult<Quote>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Creates a provider that always quotes `price` in INR.
    #[must_use]
    pub fn quoting(id: impl Into<ProviderId>, price: Price) -> Self {
        Self::with_behavior(
            id.into(),
            Behavior::Quote {
                price,
                currency: DEFAULT_CURRENCY.to_string(),
                surge_multiplier: NO_SURGE,
                estimate_minutes: 0,
            },
        )
    }

    /// Creates a provider that always fails with `error`.
    #[must_use]
    pub fn failing(id: impl Into<ProviderId>, error: ProviderError) -> Self {
        Self::with_behavior(id.into(), Behavior::Fail(error))
    }

    fn with_behavior(id: ProviderId, behavior: Behavior) -> Self {
        Self {
            id,
            behavior,
            script: Mutex::new(VecDeque::new()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sets the quote currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        if let Behavior::Quote { currency: c, .. } = &mut self.behavior {
            *c = currency.into();
        }
        self
    }

    /// Sets the surge multiplier.
    #[must_use]
    pub fn with_surge(mut self, surge: f64) -> Self {
        if let Behavior::Quote {
            surge_multiplier, ..
        } = &mut self.behavior
        {
            *surge_multiplier = surge;
        }
        self
    }

    /// Sets the estimated minutes to pickup.
    #[must_use]
    pub fn with_eta(mut self, minutes: u32) -> Self {
        if let Behavior::Quote {
            estimate_minutes, ..
        } = &mut self.behavior
        {
            *estimate_minutes = minutes;
        }
        self
    }

    /// Delays every answer.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues results returned before falling back to the fixed behavior.
    #[must_use]
    pub fn with_script(self, results: impl IntoIterator<Item = ProviderResult<Quote>>) -> Self {
        self.script.lock().extend(results);
        self
    }

    /// Returns how many times `fetch_quote` was called.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch_quote(&self, _route: &RouteKey, _at: Option<Timestamp>) -> ProviderResult<Quote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(next) = self.script.lock().pop_front() {
            return next;
        }

        match &self.behavior {
            Behavior::Quote {
                price,
                currency,
                surge_multiplier,
                estimate_minutes,
            } => QuoteBuilder::new(self.id.clone(), *price)
                .currency(currency.clone())
                .surge_multiplier(*surge_multiplier)
                .estimate_minutes(*estimate_minutes)
                .build()
                .map_err(|e| ProviderError::parse_failure(e.to_string())),
            Behavior::Fail(error) => Err(error.clone()),
        }
    }
}
