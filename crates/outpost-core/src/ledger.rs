//! Resource ledger - stock, caps and derived production rates for one colony
//!
//! The ledger is the only owner of stock. Other components read snapshots and
//! request debits or credits through [`ResourceLedger::spend`] and
//! [`ResourceLedger::credit`]. Rates are derived state: they are rebuilt from
//! the building set by [`ResourceLedger::recompute_rates`] every tick and never
//! persisted.

use crate::catalog::{Catalog, StatBlock};
use crate::event::{Event, EventKind, EventQueue};
use crate::registry::Building;
use crate::time::{SimTime, SECONDS_PER_MINUTE};
use crate::{ColonyConfig, ResourceAmount, ResourceId, ResourceRates, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Derived rates and colony totals from the last recompute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// Output per minute after bonuses and throttling
    pub production: ResourceRates,
    /// Draw per minute
    pub consumption: ResourceRates,
    /// Upkeep per minute
    pub maintenance: ResourceRates,
    pub population: f64,
    pub workforce: f64,
    pub workforce_used: f64,
    /// Factor applied to non-energy output (1 when power is sufficient)
    pub energy_ratio: f64,
    /// Factor applied to workforce-gated output (1 when staffed)
    pub workforce_ratio: f64,
}

impl Default for RateSnapshot {
    fn default() -> Self {
        Self {
            production: ResourceRates::new(),
            consumption: ResourceRates::new(),
            maintenance: ResourceRates::new(),
            population: 0.0,
            workforce: 0.0,
            workforce_used: 0.0,
            energy_ratio: 1.0,
            workforce_ratio: 1.0,
        }
    }
}

/// Stock, caps and rates of one colony
#[derive(Debug, Clone)]
pub struct ResourceLedger {
    stock: ResourceAmount,
    caps: ResourceAmount,
    rates: RateSnapshot,
    energy_resource: ResourceId,
    workforce_gated: Vec<ResourceId>,
    currency: ResourceId,
    /// Simulated time of the last `advance_to`
    last_advance: Option<SimTime>,
    /// Time stamp for emitted events
    now: SimTime,
    events: EventQueue,
}

impl ResourceLedger {
    /// Create a ledger from a colony configuration
    pub fn new(config: &ColonyConfig) -> Self {
        Self::from_parts(config.starting_stock.clone(), config.caps.clone(), config)
    }

    /// Create a ledger from persisted stock and caps
    ///
    /// The known kinds are those with a cap. Stock is clamped into `[0, cap]`;
    /// stock for kinds without a cap is dropped.
    pub fn from_parts(stock: ResourceAmount, caps: ResourceAmount, config: &ColonyConfig) -> Self {
        let caps: ResourceAmount = caps.iter().map(|(k, c)| (k.clone(), c.max(0.0))).collect();
        let stock = caps
            .iter()
            .map(|(k, cap)| (k.clone(), clamp(stock.get(k), cap)))
            .collect();
        Self {
            stock,
            caps,
            rates: RateSnapshot::default(),
            energy_resource: config.energy_resource.clone(),
            workforce_gated: config.workforce_gated.clone(),
            currency: config.currency.clone(),
            last_advance: None,
            now: 0.0,
            events: EventQueue::new(),
        }
    }

    /// Snapshot of the current stock
    pub fn stock(&self) -> ResourceAmount {
        self.stock.clone()
    }

    /// Current stock of one kind (0 if unknown)
    pub fn stock_of(&self, kind: &str) -> f64 {
        self.stock.get(kind)
    }

    /// Snapshot of the caps
    pub fn caps(&self) -> ResourceAmount {
        self.caps.clone()
    }

    /// Cap of one kind (0 if unknown)
    pub fn cap_of(&self, kind: &str) -> f64 {
        self.caps.get(kind)
    }

    /// Whether the ledger tracks this kind
    pub fn knows(&self, kind: &str) -> bool {
        self.caps.contains(kind)
    }

    /// Set the cap of a kind, adding the kind if new; stock is clamped to the new cap
    pub fn set_cap(&mut self, kind: impl Into<ResourceId>, cap: f64) {
        let kind = kind.into();
        let cap = cap.max(0.0);
        let before = self.stock.get(&kind);
        let after = clamp(before, cap);
        self.caps.set(kind.clone(), cap);
        self.stock.set(kind.clone(), after);
        if after != before {
            self.events
                .push(self.now, EventKind::StockChanged { kind, stock: after });
        }
    }

    /// The currency kind (sales proceeds, maintenance)
    pub fn currency(&self) -> &ResourceId {
        &self.currency
    }

    /// True iff every kind in `cost` is known and in stock
    ///
    /// Unknown kinds and negative or non-numeric amounts are unaffordable.
    pub fn has_sufficient(&self, cost: &ResourceAmount) -> bool {
        cost.iter().all(|(kind, amount)| {
            self.knows(kind) && amount >= 0.0 && self.stock.get(kind) >= amount
        })
    }

    /// Debit every kind in `cost`, or nothing if any kind is short
    pub fn spend(&mut self, cost: &ResourceAmount) -> bool {
        if !self.has_sufficient(cost) {
            return false;
        }
        for (kind, amount) in cost.iter() {
            if amount == 0.0 {
                continue;
            }
            let after = (self.stock.get(kind) - amount).max(0.0);
            self.stock.set(kind.clone(), after);
            self.events.push(
                self.now,
                EventKind::StockChanged {
                    kind: kind.clone(),
                    stock: after,
                },
            );
        }
        true
    }

    /// Add `amount` of `kind`, clamped to `[0, cap]`; returns the change actually applied
    ///
    /// Unknown kinds are ignored.
    pub fn credit(&mut self, kind: &ResourceId, amount: f64) -> f64 {
        if !self.knows(kind) || !amount.is_finite() {
            return 0.0;
        }
        let before = self.stock.get(kind);
        let after = clamp(before + amount, self.caps.get(kind));
        let applied = after - before;
        if applied != 0.0 {
            self.stock.set(kind.clone(), after);
            self.events.push(
                self.now,
                EventKind::StockChanged {
                    kind: kind.clone(),
                    stock: after,
                },
            );
        }
        if applied > 0.0 {
            self.events.push(
                self.now,
                EventKind::ResourceCollected {
                    kind: kind.clone(),
                    amount: applied,
                },
            );
        }
        applied
    }

    /// Rebuild production and consumption rates from the current building set
    ///
    /// Buildings under construction contribute nothing. Calling this twice with
    /// the same buildings yields identical rates.
    pub fn recompute_rates<'a>(
        &mut self,
        buildings: impl IntoIterator<Item = &'a Building>,
        catalog: &Catalog,
    ) -> Result<()> {
        let mut active: Vec<(&StatBlock, bool)> = Vec::new();
        for building in buildings {
            if building.is_constructing() {
                continue;
            }
            let stats = catalog.stats_for(&building.type_id, building.level)?;
            active.push((stats, building.nearby_node.is_some()));
        }

        let mut rates = RateSnapshot::default();
        for (stats, has_node) in &active {
            let bonus = if *has_node {
                stats.resource_node_bonus
            } else {
                1.0
            };
            for (kind, rate) in stats.production.iter() {
                rates.production.add(kind.clone(), rate * bonus);
            }
            if stats.energy_consumption != 0.0 {
                rates
                    .consumption
                    .add(self.energy_resource.clone(), stats.energy_consumption);
            }
            rates.maintenance.merge(&stats.maintenance);
            rates.population += stats.effects.population;
            rates.workforce += stats.effects.workforce;
            rates.workforce_used += stats.workforce_required;
        }

        // The credits bonus is global and multiplicative, so it applies once to the total
        let credits_multiplier: f64 = active
            .iter()
            .filter_map(|(stats, _)| stats.effects.credits_bonus)
            .product();
        if rates.production.contains(&self.currency) {
            let credits = rates.production.get(&self.currency);
            rates
                .production
                .set(self.currency.clone(), credits * credits_multiplier);
        }

        let energy_produced = rates.production.get(&self.energy_resource);
        let energy_consumed = rates.consumption.get(&self.energy_resource);
        if energy_produced < energy_consumed {
            let ratio = energy_produced / energy_consumed;
            rates.energy_ratio = ratio;
            let energy = self.energy_resource.clone();
            for (kind, value) in rate_entries(&rates.production) {
                if kind != energy {
                    rates.production.set(kind, value * ratio);
                }
            }
        }

        if rates.workforce_used > rates.workforce {
            let ratio = rates.workforce / rates.workforce_used;
            rates.workforce_ratio = ratio;
            for kind in &self.workforce_gated {
                if rates.production.contains(kind) {
                    let value = rates.production.get(kind);
                    rates.production.set(kind.clone(), value * ratio);
                }
            }
        }

        if rates.energy_ratio < 1.0 && self.rates.energy_ratio >= 1.0 {
            warn!(
                produced = energy_produced,
                consumed = energy_consumed,
                "energy shortage, throttling production"
            );
            self.events.push(
                self.now,
                EventKind::EnergyShortage {
                    ratio: rates.energy_ratio,
                },
            );
        }
        if rates.workforce_ratio < 1.0 && self.rates.workforce_ratio >= 1.0 {
            warn!(
                available = rates.workforce,
                required = rates.workforce_used,
                "workforce shortage"
            );
            self.events.push(
                self.now,
                EventKind::WorkforceShortage {
                    ratio: rates.workforce_ratio,
                },
            );
        }

        debug!(
            buildings = active.len(),
            production = %rates.production,
            consumption = %rates.consumption,
            "rates recomputed"
        );
        self.rates = rates;
        Ok(())
    }

    /// Apply `elapsed_minutes` of production, consumption and maintenance
    pub fn advance(&mut self, elapsed_minutes: f64) {
        if !(elapsed_minutes.is_finite() && elapsed_minutes > 0.0) {
            return;
        }
        let kinds: Vec<ResourceId> = self.caps.kinds().cloned().collect();
        for kind in kinds {
            let cap = self.caps.get(&kind);
            let before = self.stock.get(&kind);

            let produced = self.rates.production.get(&kind) * elapsed_minutes;
            let after_production = clamp(before + produced, cap);
            let consumed = self.rates.consumption.get(&kind) * elapsed_minutes;
            let upkeep = self.rates.maintenance.get(&kind) * elapsed_minutes;
            let after = clamp(after_production - consumed - upkeep, cap);

            if after_production > before {
                self.events.push(
                    self.now,
                    EventKind::ResourceCollected {
                        kind: kind.clone(),
                        amount: after_production - before,
                    },
                );
            }
            if after != before {
                self.stock.set(kind.clone(), after);
                self.events
                    .push(self.now, EventKind::StockChanged { kind, stock: after });
            }
        }
    }

    /// Advance to simulated time `now`, using the time since the previous call
    ///
    /// The first call only records the time. Time going backwards is ignored.
    pub fn advance_to(&mut self, now: SimTime) {
        self.now = now;
        let elapsed = match self.last_advance {
            Some(last) if now > last => now - last,
            Some(_) => return,
            None => 0.0,
        };
        self.last_advance = Some(now);
        self.advance(elapsed / SECONDS_PER_MINUTE);
    }

    /// Set the time stamp used for events emitted outside of `advance_to`
    pub fn mark_time(&mut self, now: SimTime) {
        self.now = now;
    }

    /// Rates from the last recompute
    pub fn rates(&self) -> &RateSnapshot {
        &self.rates
    }

    /// Production rate of one kind, per minute
    pub fn production_rate(&self, kind: &str) -> f64 {
        self.rates.production.get(kind)
    }

    /// Consumption rate of one kind, per minute
    pub fn consumption_rate(&self, kind: &str) -> f64 {
        self.rates.consumption.get(kind)
    }

    pub fn population(&self) -> f64 {
        self.rates.population
    }

    pub fn workforce(&self) -> f64 {
        self.rates.workforce
    }

    pub fn workforce_used(&self) -> f64 {
        self.rates.workforce_used
    }

    /// Take the pending change notifications
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }
}

fn clamp(value: f64, cap: f64) -> f64 {
    value.max(0.0).min(cap)
}

fn rate_entries(rates: &ResourceRates) -> Vec<(ResourceId, f64)> {
    rates.iter().map(|(k, v)| (k.clone(), v)).collect()
}
