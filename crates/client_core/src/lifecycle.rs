use shared::domain::OrderStatus;

/// Guard for the automatic open-transition: an order begins review the
/// first time its detail view opens, and never regresses once it is
/// already reviewing or reviewed.
pub fn should_begin_review(current: Option<OrderStatus>) -> bool {
    !matches!(
        current,
        Some(OrderStatus::Reviewing) | Some(OrderStatus::Reviewed)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_and_unparsed_statuses_begin_review() {
        assert!(should_begin_review(Some(OrderStatus::New)));
        assert!(should_begin_review(None));
        assert!(should_begin_review(Some(OrderStatus::Archived)));
    }

    #[test]
    fn reviewing_and_reviewed_orders_never_regress() {
        assert!(!should_begin_review(Some(OrderStatus::Reviewing)));
        assert!(!should_begin_review(Some(OrderStatus::Reviewed)));
    }
}
