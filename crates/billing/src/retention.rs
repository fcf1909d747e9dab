//! Retention window resolution and cutoff arithmetic.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::BillingCatalog;

/// Retention actually enforced for one tenant during one run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionWindow {
    /// What the tenant's record says.
    pub configured_days: i32,
    /// After the upsell grace extension. Always `>= configured_days`.
    pub effective_days: i32,
}

impl RetentionWindow {
    /// Resolve the window for a tenant, or `None` when enforcement is disabled
    /// (`configured_days <= 0`).
    pub fn resolve(catalog: &BillingCatalog, configured_days: i32) -> Option<Self> {
        if configured_days <= 0 {
            return None;
        }

        Some(Self {
            configured_days,
            effective_days: catalog.effective_retention_days(configured_days),
        })
    }

    /// Whether a higher plan tier extended the configured window.
    pub fn is_extended(&self) -> bool {
        self.effective_days > self.configured_days
    }

    pub fn cutoff(&self, today: NaiveDate) -> DateTime<Utc> {
        retention_cutoff(today, self.effective_days)
    }
}

/// Midnight UTC of `today` minus `days`. Events strictly before this instant
/// are outside the retention window.
///
/// Saturates at the earliest representable date.
pub fn retention_cutoff(today: NaiveDate, days: i32) -> DateTime<Utc> {
    let date = today
        .checked_sub_days(Days::new(u64::from(days.unsigned_abs())))
        .unwrap_or(NaiveDate::MIN);
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{BillingPlan, PlanId};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn catalog() -> BillingCatalog {
        let plans = vec![
            BillingPlan::with_retention("P15", 15),
            BillingPlan::with_retention("P30", 30),
            BillingPlan::with_retention("P60", 60),
            BillingPlan::with_retention("P90", 90),
        ];
        BillingCatalog::new(plans, &PlanId::new("P15")).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn thirty_day_tenant_is_extended_to_sixty() {
        let window = RetentionWindow::resolve(&catalog(), 30).unwrap();
        assert_eq!(window.effective_days, 60);
        assert!(window.is_extended());
        assert_eq!(
            window.cutoff(today()),
            Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn top_tier_tenant_keeps_its_own_window() {
        let window = RetentionWindow::resolve(&catalog(), 90).unwrap();
        assert_eq!(window.effective_days, 90);
        assert!(!window.is_extended());
        assert_eq!(
            window.cutoff(today()),
            Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn disabled_retention_resolves_to_nothing() {
        assert_eq!(RetentionWindow::resolve(&catalog(), 0), None);
        assert_eq!(RetentionWindow::resolve(&catalog(), -5), None);
    }

    #[test]
    fn cutoff_is_midnight_utc() {
        let cutoff = retention_cutoff(today(), 1);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap());
    }

    proptest! {
        #[test]
        fn cutoff_moves_back_exactly_the_effective_days(configured in 1i32..5_000) {
            let window = RetentionWindow::resolve(&catalog(), configured).unwrap();
            let midnight = today().and_time(NaiveTime::MIN).and_utc();
            let diff = midnight - window.cutoff(today());
            prop_assert_eq!(diff.num_days(), i64::from(window.effective_days));
            prop_assert!(window.effective_days >= configured);
        }
    }
}
