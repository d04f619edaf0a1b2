//! Request orchestration between the HTTP layer, the size source and the solver.

use std::sync::Arc;

use thiserror::Error;

use crate::error::PackError;
use crate::model::{Combination, Quantity};
use crate::optimizer::{PackingConfig, calculate_with_config};
use crate::sizes::{PackSizeSource, SizeSourceError};

/// Failure of a service call.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Pack(#[from] PackError),

    #[error("pack size source failed: {0}")]
    Source(#[from] SizeSourceError),
}

impl ServiceError {
    /// Stable machine-readable code for error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Pack(err) => err.code(),
            ServiceError::Source(_) => "internal_error",
        }
    }

    /// Whether the failure is a defect or an infrastructure problem rather
    /// than bad input.
    pub fn is_internal(&self) -> bool {
        match self {
            ServiceError::Pack(err) => err.is_internal(),
            ServiceError::Source(_) => true,
        }
    }
}

/// Calculates pack combinations against the configured size source.
#[derive(Clone)]
pub struct PackService {
    source: Arc<dyn PackSizeSource>,
    config: PackingConfig,
}

impl PackService {
    pub fn new(source: Arc<dyn PackSizeSource>, config: PackingConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &PackingConfig {
        &self.config
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Current pack sizes from the source.
    pub fn pack_sizes(&self) -> Result<Vec<u64>, ServiceError> {
        Ok(self.source.list()?)
    }

    /// Calculates the best combination for `quantity`.
    ///
    /// A non-empty `packs_override` replaces the source's sizes for this call
    /// only. It must contain positive values; duplicates are ignored. Source
    /// sizes that do not fit the solver's input range are reported as a source
    /// failure rather than being altered.
    pub fn calculate(
        &self,
        quantity: i64,
        packs_override: &[i64],
    ) -> Result<Combination, ServiceError> {
        Quantity::new(quantity)?;

        if !packs_override.is_empty() {
            return Ok(calculate_with_config(quantity, packs_override, &self.config)?);
        }

        let listed = self.source.list()?;
        if listed.is_empty() {
            return Err(PackError::NoPackSizes.into());
        }
        let sizes = listed
            .into_iter()
            .map(|s| i64::try_from(s).map_err(|_| SizeSourceError::OutOfRange(s)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(calculate_with_config(quantity, &sizes, &self.config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizes::StaticSizeSource;

    struct FailingSource;

    impl PackSizeSource for FailingSource {
        fn list(&self) -> Result<Vec<u64>, SizeSourceError> {
            Err(SizeSourceError::PathNotSet)
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn service(sizes: &[u64]) -> PackService {
        PackService::new(
            Arc::new(StaticSizeSource::new(sizes.iter().copied())),
            PackingConfig::default(),
        )
    }

    #[test]
    fn uses_source_without_override() {
        let svc = service(&[250, 500, 1000, 2000, 5000]);
        let combo = svc.calculate(12001, &[]).unwrap();
        assert_eq!(combo.total_items, 12250);
        assert_eq!(combo.total_packs, 4);
    }

    #[test]
    fn override_replaces_source_sizes() {
        let svc = service(&[250, 500]);
        let combo = svc.calculate(10, &[7, 3, 3]).unwrap();
        assert_eq!(combo.total_items, 10);
        assert_eq!(combo.count_for(3), 1);
        assert_eq!(combo.count_for(7), 1);
    }

    #[test]
    fn invalid_quantity_wins_over_other_errors() {
        let svc = PackService::new(Arc::new(FailingSource), PackingConfig::default());
        let err = svc.calculate(0, &[-1]).unwrap_err();
        assert!(matches!(err, ServiceError::Pack(PackError::InvalidQuantity(0))));
        assert_eq!(err.code(), "invalid_quantity");
    }

    #[test]
    fn override_with_non_positive_size_is_rejected() {
        let svc = service(&[250]);
        let err = svc.calculate(10, &[5, -1]).unwrap_err();
        assert!(matches!(err, ServiceError::Pack(PackError::InvalidPackSize(-1))));
        assert_eq!(err.code(), "invalid_pack");
        assert!(!err.is_internal());
    }

    #[test]
    fn empty_source_reports_no_pack_sizes() {
        let svc = service(&[]);
        let err = svc.calculate(10, &[]).unwrap_err();
        assert!(matches!(err, ServiceError::Pack(PackError::NoPackSizes)));
        assert_eq!(err.code(), "no_pack_sizes");
    }

    #[test]
    fn source_failure_is_internal() {
        let svc = PackService::new(Arc::new(FailingSource), PackingConfig::default());
        let err = svc.calculate(10, &[]).unwrap_err();
        assert!(err.is_internal());
        assert_eq!(err.code(), "internal_error");
        assert!(svc.pack_sizes().is_err());
    }

    #[test]
    fn oversized_source_size_is_reported_not_clamped() {
        let svc = service(&[250, u64::MAX]);
        let err = svc.calculate(10, &[]).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Source(SizeSourceError::OutOfRange(u64::MAX))
        ));
        assert!(err.is_internal());

        let combo = svc.calculate(10, &[4]).unwrap();
        assert_eq!(combo.count_for(4), 3);
    }

    #[test]
    fn exposes_solver_config() {
        let config = PackingConfig::builder().gcd_scaling(false).build();
        let svc = PackService::new(Arc::new(StaticSizeSource::new([5])), config);
        assert_eq!(*svc.config(), config);
    }

    #[test]
    fn lists_source_sizes() {
        let svc = service(&[1000, 250, 500]);
        assert_eq!(svc.pack_sizes().unwrap(), vec![250, 500, 1000]);
        assert_eq!(svc.source_name(), "static");
    }
}
