//! Data models for the pack calculator.
//!
//! - `PackSize`: items contained in one shippable pack
//! - `Quantity`: items requested by the customer
//! - `Combination`: the packs chosen for one request, with derived totals
//!
//! `PackSize` and `Quantity` can only be built through validating
//! constructors, so a value of either type is always strictly positive.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::PackError;

/// Number of items in one shippable pack. Always > 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackSize(u64);

impl PackSize {
    /// Creates a pack size after validation.
    ///
    /// # Examples
    /// ```
    /// use packwise::model::PackSize;
    ///
    /// assert_eq!(PackSize::new(250).unwrap().get(), 250);
    /// assert!(PackSize::new(0).is_err());
    /// assert!(PackSize::new(-10).is_err());
    /// ```
    pub fn new(size: i64) -> Result<Self, PackError> {
        u64::try_from(size)
            .ok()
            .filter(|&s| s > 0)
            .map(Self)
            .ok_or(PackError::InvalidPackSize(size))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PackSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Requested number of items. Always > 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u64);

impl Quantity {
    /// Creates a quantity after validation.
    ///
    /// # Returns
    /// `Ok(Quantity)` for values > 0, otherwise `Err(PackError::InvalidQuantity)`
    pub fn new(quantity: i64) -> Result<Self, PackError> {
        u64::try_from(quantity)
            .ok()
            .filter(|&q| q > 0)
            .map(Self)
            .ok_or(PackError::InvalidQuantity(quantity))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Packs chosen for a request.
///
/// # Fields
/// * `items_by_pack` - Pack size -> number of packs of that size (only counts > 0)
/// * `total_items` - Sum of size × count over `items_by_pack`
/// * `total_packs` - Sum of counts
/// * `leftover` - Items shipped beyond the requested quantity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combination {
    pub items_by_pack: BTreeMap<u64, u64>,
    pub total_items: u64,
    pub total_packs: u64,
    pub leftover: u64,
}

impl Combination {
    /// Builds a combination from per-size counts, deriving all totals.
    ///
    /// Entries with a zero count are dropped. Returns `None` if the totals
    /// overflow or the combination does not cover `quantity`.
    pub fn from_counts(
        quantity: Quantity,
        counts: impl IntoIterator<Item = (u64, u64)>,
    ) -> Option<Self> {
        let mut items_by_pack = BTreeMap::new();
        for (size, count) in counts.into_iter().filter(|(_, c)| *c > 0) {
            *items_by_pack.entry(size).or_insert(0u64) += count;
        }

        let mut total_items = 0u64;
        let mut total_packs = 0u64;
        for (&size, &count) in &items_by_pack {
            total_items = total_items.checked_add(size.checked_mul(count)?)?;
            total_packs = total_packs.checked_add(count)?;
        }
        let leftover = total_items.checked_sub(quantity.get())?;

        Some(Self {
            items_by_pack,
            total_items,
            total_packs,
            leftover,
        })
    }

    /// Number of packs of the given size in this combination.
    pub fn count_for(&self, size: u64) -> u64 {
        self.items_by_pack.get(&size).copied().unwrap_or(0)
    }

    /// The quantity this combination was computed for.
    pub fn requested(&self) -> u64 {
        self.total_items - self.leftover
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_size_rejects_non_positive() {
        assert_eq!(PackSize::new(0), Err(PackError::InvalidPackSize(0)));
        assert_eq!(PackSize::new(-10), Err(PackError::InvalidPackSize(-10)));
        assert_eq!(PackSize::new(250).map(PackSize::get), Ok(250));
    }

    #[test]
    fn quantity_rejects_non_positive() {
        assert_eq!(Quantity::new(0), Err(PackError::InvalidQuantity(0)));
        assert_eq!(Quantity::new(-5), Err(PackError::InvalidQuantity(-5)));
        assert_eq!(Quantity::new(10).map(Quantity::get), Ok(10));
    }

    #[test]
    fn combination_derives_totals() {
        let quantity = Quantity::new(12001).unwrap();
        let combo = Combination::from_counts(
            quantity,
            [(5000, 2), (2000, 1), (250, 1), (500, 0)],
        )
        .expect("valid combination");

        assert_eq!(combo.total_items, 12250);
        assert_eq!(combo.total_packs, 4);
        assert_eq!(combo.leftover, 249);
        assert_eq!(combo.requested(), 12001);
        assert_eq!(combo.count_for(5000), 2);
        assert_eq!(combo.count_for(500), 0);
        assert!(!combo.items_by_pack.contains_key(&500));
    }

    #[test]
    fn combination_below_quantity_is_rejected() {
        let quantity = Quantity::new(1000).unwrap();
        assert!(Combination::from_counts(quantity, [(250, 3)]).is_none());
    }
}
