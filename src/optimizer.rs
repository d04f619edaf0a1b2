//! Pack combination solver.
//!
//! Given a requested quantity and a set of pack sizes, finds the combination
//! that ships the fewest items (never fewer than requested) and, among those,
//! uses the fewest packs.
//!
//! The search is an unbounded coin-change dynamic program over achievable
//! totals. Two observations keep it small:
//! - every reachable total is a multiple of `g = gcd(sizes)`, so the whole
//!   problem can be solved in units of `g`;
//! - the optimal total never exceeds `ceil(quantity / g) + max_size / g - 1`
//!   (scaled), because any total beyond that still covers the quantity after
//!   removing one pack.
//!
//! Work and memory are `O(U × sizes)` and `O(U)` for the scaled window `U`.
//! Disabling GCD scaling multiplies `U` by `g`; for the default size set
//! (`g = 250`) that is the difference between a few hundred and a few hundred
//! thousand cells for a six-digit quantity.
//!
//! Each cell holds two `u32` values, so `PackingConfig::max_search_span`
//! bounds a solve at about 8 bytes per cell: the default of 10 million cells
//! is roughly 80 MB. With a unit size (or sizes whose gcd is 1) the window is
//! `quantity + max_size`, so the default rejects quantities near 10 million.
//! Raise the limit if such inputs are expected and memory allows.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::PackError;
use crate::model::{Combination, PackSize, Quantity};
use crate::numeric::{ceil_div, gcd_all};

/// Marks a total that no combination reaches exactly.
const UNREACHABLE: u32 = u32::MAX;

/// Marks a total without a recorded last pack. Scaled sizes are always >= 1.
const NO_PACK: u32 = 0;

/// Configuration for the solver.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PackingConfig {
    /// Solve in units of the greatest common divisor of all pack sizes.
    pub gcd_scaling: bool,
    /// Largest number of DP cells (`U + 1`) a single call may allocate, at
    /// about 8 bytes per cell.
    pub max_search_span: u64,
}

impl PackingConfig {
    pub const DEFAULT_GCD_SCALING: bool = true;
    pub const DEFAULT_MAX_SEARCH_SPAN: u64 = 10_000_000;
    /// DP cells are `u32`, so the window can never be wider than this.
    pub const MAX_SEARCH_SPAN_CEILING: u64 = u32::MAX as u64;

    /// Creates a builder for custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }

    fn effective_span_limit(&self) -> u64 {
        self.max_search_span.min(Self::MAX_SEARCH_SPAN_CEILING)
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            gcd_scaling: Self::DEFAULT_GCD_SCALING,
            max_search_span: Self::DEFAULT_MAX_SEARCH_SPAN,
        }
    }
}

/// Builder for `PackingConfig`.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    /// Enables or disables GCD scaling.
    pub fn gcd_scaling(mut self, enabled: bool) -> Self {
        self.config.gcd_scaling = enabled;
        self
    }

    /// Sets the maximum DP window.
    pub fn max_search_span(mut self, span: u64) -> Self {
        self.config.max_search_span = span;
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Calculates the best pack combination with the default configuration.
///
/// # Parameters
/// * `quantity` - Requested number of items, must be > 0
/// * `pack_sizes` - Allowed pack sizes; order and duplicates do not matter
///
/// # Examples
/// ```
/// use packwise::optimizer::calculate;
///
/// let combo = calculate(501, &[250, 500, 1000]).unwrap();
/// assert_eq!(combo.total_items, 750);
/// assert_eq!(combo.total_packs, 2);
/// assert_eq!(combo.leftover, 249);
/// ```
pub fn calculate(quantity: i64, pack_sizes: &[i64]) -> Result<Combination, PackError> {
    calculate_with_config(quantity, pack_sizes, &PackingConfig::default())
}

/// Calculates the best pack combination.
///
/// Fails with a user-input error for a non-positive quantity, an empty or
/// non-positive size list, or a window above `config.max_search_span`.
/// `Infeasible` and `Reconstruction` indicate a solver defect.
pub fn calculate_with_config(
    quantity: i64,
    pack_sizes: &[i64],
    config: &PackingConfig,
) -> Result<Combination, PackError> {
    let quantity = Quantity::new(quantity)?;
    let sizes = normalize_pack_sizes(pack_sizes)?;

    let plan = SearchPlan::new(quantity, &sizes, config)?;
    debug!(
        quantity = quantity.get(),
        unit = plan.unit,
        target = plan.target,
        upper = plan.upper,
        sizes = plan.scaled.len(),
        "solving pack combination"
    );

    let table = plan.fill();
    let best = plan.best_total(&table).ok_or(PackError::Infeasible {
        quantity: quantity.get(),
    })?;
    plan.reconstruct(quantity, &table, best)
}

/// Validates, deduplicates and sorts pack sizes ascending.
///
/// # Returns
/// `Err(NoPackSizes)` for an empty slice, `Err(InvalidPackSize)` for the
/// first value <= 0.
pub fn normalize_pack_sizes(pack_sizes: &[i64]) -> Result<Vec<PackSize>, PackError> {
    if pack_sizes.is_empty() {
        return Err(PackError::NoPackSizes);
    }

    let mut sizes = pack_sizes
        .iter()
        .map(|&s| PackSize::new(s))
        .collect::<Result<Vec<_>, _>>()?;
    sizes.sort_unstable();
    sizes.dedup();
    Ok(sizes)
}

/// Scaled search problem derived from one request.
#[derive(Debug)]
struct SearchPlan {
    /// Items per scaled unit (the GCD, or 1 without scaling).
    unit: u64,
    /// Smallest scaled total that covers the quantity.
    target: usize,
    /// Largest scaled total that can still be optimal.
    upper: usize,
    /// Scaled pack sizes, ascending.
    scaled: Vec<usize>,
}

/// DP table indexed by scaled total.
struct DpTable {
    /// Minimum packs to reach the total exactly, `UNREACHABLE` otherwise.
    packs: Vec<u32>,
    /// Scaled size of the last pack on a best path, `NO_PACK` otherwise.
    last: Vec<u32>,
}

impl SearchPlan {
    fn new(
        quantity: Quantity,
        sizes: &[PackSize],
        config: &PackingConfig,
    ) -> Result<Self, PackError> {
        let raw: Vec<u64> = sizes.iter().map(|s| s.get()).collect();
        let unit = if config.gcd_scaling {
            gcd_all(&raw).ok_or(PackError::NoPackSizes)?
        } else {
            1
        };
        let largest = raw.last().copied().ok_or(PackError::NoPackSizes)? / unit;

        let limit = config.effective_span_limit();
        let too_large = |required: u64| PackError::SearchSpaceTooLarge { required, limit };

        let target = ceil_div(quantity.get(), unit).ok_or_else(|| too_large(u64::MAX))?;
        // Window is [0, target + largest - 1], i.e. target + largest cells.
        let span = target
            .checked_add(largest)
            .ok_or_else(|| too_large(u64::MAX))?;
        if span > limit {
            return Err(too_large(span));
        }

        let target = usize::try_from(target).map_err(|_| too_large(span))?;
        let upper = usize::try_from(span - 1).map_err(|_| too_large(span))?;
        let scaled = raw
            .iter()
            .map(|&s| usize::try_from(s / unit).unwrap_or(usize::MAX))
            .collect();

        Ok(Self {
            unit,
            target,
            upper,
            scaled,
        })
    }

    /// Relaxes totals in increasing order, so `packs[t]` is final before it
    /// is used. The first strict improvement wins ties.
    fn fill(&self) -> DpTable {
        let cells = self.upper + 1;
        let mut packs = vec![UNREACHABLE; cells];
        let mut last = vec![NO_PACK; cells];
        packs[0] = 0;

        for t in 0..=self.upper {
            let here = packs[t];
            if here == UNREACHABLE {
                continue;
            }
            let next = here + 1;
            for &s in &self.scaled {
                let nt = match t.checked_add(s) {
                    Some(nt) if nt <= self.upper => nt,
                    // sizes are ascending
                    _ => break,
                };
                if next < packs[nt] {
                    packs[nt] = next;
                    // s <= nt <= upper < u32::MAX
                    last[nt] = s as u32;
                }
            }
        }

        DpTable { packs, last }
    }

    /// Smallest reachable total in `[target, upper]`. Each total has a single
    /// pack count, so the first hit also has the fewest packs for that total.
    fn best_total(&self, table: &DpTable) -> Option<usize> {
        (self.target..=self.upper).find(|&t| table.packs[t] != UNREACHABLE)
    }

    fn reconstruct(
        &self,
        quantity: Quantity,
        table: &DpTable,
        best: usize,
    ) -> Result<Combination, PackError> {
        let broken = |total: usize| PackError::Reconstruction {
            total: total as u64,
        };

        let mut counts: BTreeMap<usize, u64> = BTreeMap::new();
        let mut t = best;
        while t > 0 {
            let s = table.last[t] as usize;
            if s == NO_PACK as usize || s > t {
                return Err(broken(t));
            }
            *counts.entry(s).or_insert(0) += 1;
            t -= s;
        }

        let combination = Combination::from_counts(
            quantity,
            counts
                .into_iter()
                .map(|(s, count)| (s as u64 * self.unit, count)),
        )
        .ok_or_else(|| broken(best))?;

        if combination.total_packs != u64::from(table.packs[best])
            || combination.total_items != best as u64 * self.unit
        {
            return Err(broken(best));
        }
        Ok(combination)
    }
}
