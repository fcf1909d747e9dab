//! Write-side rules for organization records.
//!
//! The tenant store runs these before persisting; the retention job only ever
//! reads records that already passed them.

use serde::Serialize;

use tidemark_billing::BillingCatalog;
use tidemark_core::{DomainError, DomainResult};

use crate::organization::Organization;

/// One broken rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationFailure {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// Check every rule and return all failures (empty when valid).
pub fn validate_organization(
    org: &Organization,
    catalog: &BillingCatalog,
) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();

    if org.name.trim().is_empty() {
        failures.push(ValidationFailure::new("name", "Please specify a valid name."));
    }
    if org.plan_id.is_empty() {
        failures.push(ValidationFailure::new("plan_id", "Please specify a valid plan id."));
    }
    if org.has_premium_features && catalog.is_free_plan(&org.plan_id) {
        failures.push(ValidationFailure::new(
            "has_premium_features",
            "Premium features cannot be enabled on the free plan.",
        ));
    }

    if org.is_paid() {
        if is_blank(&org.stripe_customer_id) {
            failures.push(ValidationFailure::new(
                "stripe_customer_id",
                "The stripe customer should be set on paid plans.",
            ));
        }
        if is_blank(&org.card_last4) {
            failures.push(ValidationFailure::new(
                "card_last4",
                "The card last four should be set on paid plans.",
            ));
        }
        if org.subscribe_date.is_none() {
            failures.push(ValidationFailure::new(
                "subscribe_date",
                "The subscribe date should be set on paid plans.",
            ));
        }
        if org.billing_change_date.is_none() {
            failures.push(ValidationFailure::new(
                "billing_change_date",
                "The billing change date should be set on paid plans.",
            ));
        }
        if org.billing_changed_by_user_id.is_none() {
            failures.push(ValidationFailure::new(
                "billing_changed_by_user_id",
                "The billing changed by user id should be set on paid plans.",
            ));
        }
    }

    if org.is_suspended {
        if org.suspension_code.is_none() {
            failures.push(ValidationFailure::new(
                "suspension_code",
                "Please specify a valid suspension code.",
            ));
        }
        if org.suspension_date.is_none() {
            failures.push(ValidationFailure::new(
                "suspension_date",
                "Please specify a valid suspension date.",
            ));
        }
        if org.suspended_by_user_id.is_none() {
            failures.push(ValidationFailure::new(
                "suspended_by_user_id",
                "Please specify a user id of user that suspended this organization.",
            ));
        }
    } else {
        if org.suspension_code.is_some() {
            failures.push(ValidationFailure::new(
                "suspension_code",
                "The suspension code cannot be set while an organization is not suspended.",
            ));
        }
        if org.suspension_date.is_some() {
            failures.push(ValidationFailure::new(
                "suspension_date",
                "The suspension date cannot be set while an organization is not suspended.",
            ));
        }
        if org.suspended_by_user_id.is_some() {
            failures.push(ValidationFailure::new(
                "suspended_by_user_id",
                "The suspended by user id cannot be set while an organization is not suspended.",
            ));
        }
    }

    failures
}

/// `validate_organization`, folded into a single domain error.
pub fn ensure_valid(org: &Organization, catalog: &BillingCatalog) -> DomainResult<()> {
    let failures = validate_organization(org, catalog);
    if failures.is_empty() {
        return Ok(());
    }

    let messages: Vec<&str> = failures.iter().map(|f| f.message).collect();
    Err(DomainError::validation(messages.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tidemark_billing::PlanId;
    use tidemark_core::UserId;

    use crate::organization::SuspensionCode;

    fn catalog() -> BillingCatalog {
        BillingCatalog::default()
    }

    fn free_org() -> Organization {
        Organization::new("Acme", catalog().free_plan().id.clone(), 3)
    }

    fn paid_org() -> Organization {
        let mut org = Organization::new("Acme", PlanId::new("EX_SMALL"), 30);
        org.has_premium_features = true;
        org.billing_price_cents = 1_500;
        org.stripe_customer_id = Some("cus_123".to_string());
        org.card_last4 = Some("4242".to_string());
        org.subscribe_date = Some(Utc::now());
        org.billing_change_date = Some(Utc::now());
        org.billing_changed_by_user_id = Some(UserId::new());
        org
    }

    fn fields(org: &Organization) -> Vec<&'static str> {
        validate_organization(org, &catalog())
            .into_iter()
            .map(|f| f.field)
            .collect()
    }

    #[test]
    fn well_formed_records_pass() {
        assert!(ensure_valid(&free_org(), &catalog()).is_ok());
        assert!(ensure_valid(&paid_org(), &catalog()).is_ok());
    }

    #[test]
    fn name_and_plan_are_required() {
        let mut org = free_org();
        org.name = "  ".to_string();
        org.plan_id = PlanId::new("");
        assert_eq!(fields(&org), vec!["name", "plan_id"]);
    }

    #[test]
    fn premium_features_are_rejected_on_free_plan() {
        let mut org = free_org();
        org.has_premium_features = true;
        assert_eq!(fields(&org), vec!["has_premium_features"]);
    }

    #[test]
    fn paid_plans_require_billing_details() {
        let mut org = paid_org();
        org.stripe_customer_id = None;
        org.card_last4 = Some(String::new());
        org.subscribe_date = None;
        org.billing_change_date = None;
        org.billing_changed_by_user_id = None;
        assert_eq!(
            fields(&org),
            vec![
                "stripe_customer_id",
                "card_last4",
                "subscribe_date",
                "billing_change_date",
                "billing_changed_by_user_id",
            ]
        );
    }

    #[test]
    fn billing_details_may_linger_after_downgrade() {
        let mut org = paid_org();
        org.billing_price_cents = 0;
        org.has_premium_features = false;
        org.plan_id = catalog().free_plan().id.clone();
        assert!(fields(&org).is_empty());
    }

    #[test]
    fn suspended_records_need_suspension_details() {
        let mut org = free_org();
        org.is_suspended = true;
        assert_eq!(
            fields(&org),
            vec!["suspension_code", "suspension_date", "suspended_by_user_id"]
        );

        org.suspension_code = Some(SuspensionCode::Abuse);
        org.suspension_date = Some(Utc::now());
        org.suspended_by_user_id = Some(UserId::new());
        assert!(fields(&org).is_empty());
    }

    #[test]
    fn active_records_must_not_carry_suspension_details() {
        let mut org = free_org();
        org.suspension_code = Some(SuspensionCode::Billing);
        org.suspension_date = Some(Utc::now());
        org.suspended_by_user_id = Some(UserId::new());
        assert_eq!(
            fields(&org),
            vec!["suspension_code", "suspension_date", "suspended_by_user_id"]
        );
    }

    #[test]
    fn ensure_valid_joins_messages_into_domain_error() {
        let mut org = free_org();
        org.name = String::new();
        match ensure_valid(&org, &catalog()) {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("valid name")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
