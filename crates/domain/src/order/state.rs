//! Order status state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The delivery status of an order.
///
/// ```text
/// PREPARING_PACKAGE ──► IN_TRANSIT ──► DELIVERED
/// ```
///
/// Whether moves outside this graph are accepted depends on the
/// [`TransitionPolicy`] in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Initial status assigned at issuance.
    #[default]
    PreparingPackage,

    /// The package has left the warehouse.
    InTransit,

    /// Terminal status.
    Delivered,
}

impl OrderStatus {
    /// Returns the canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PreparingPackage => "PREPARING_PACKAGE",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::Delivered => "DELIVERED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::PreparingPackage => 0,
            OrderStatus::InTransit => 1,
            OrderStatus::Delivered => 2,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    /// Parses a status name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PREPARING_PACKAGE" => Ok(OrderStatus::PreparingPackage),
            "IN_TRANSIT" => Ok(OrderStatus::InTransit),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            _ => Err(OrderError::UnknownStatus(s.to_string())),
        }
    }
}

/// Which status changes an order accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any status may follow any other.
    #[default]
    Any,

    /// Only forward moves along the lifecycle, or re-asserting the current status.
    Forward,
}

impl TransitionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPolicy::Any => "any",
            TransitionPolicy::Forward => "forward",
        }
    }

    /// Checks whether `from -> to` is allowed under this policy.
    pub fn check(&self, from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        match self {
            TransitionPolicy::Any => Ok(()),
            TransitionPolicy::Forward if to.rank() >= from.rank() => Ok(()),
            TransitionPolicy::Forward => Err(OrderError::InvalidTransition { from, to }),
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(TransitionPolicy::Any),
            "forward" => Ok(TransitionPolicy::Forward),
            other => Err(format!("unknown transition policy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_preparing_package() {
        assert_eq!(OrderStatus::default(), OrderStatus::PreparingPackage);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("in_transit".parse::<OrderStatus>().unwrap(), OrderStatus::InTransit);
        assert_eq!("Delivered".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert_eq!(
            " preparing_package ".parse::<OrderStatus>().unwrap(),
            OrderStatus::PreparingPackage
        );
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, OrderError::UnknownStatus(ref s) if s == "lost"));
    }

    #[test]
    fn test_only_delivered_is_terminal() {
        assert!(!OrderStatus::PreparingPackage.is_terminal());
        assert!(!OrderStatus::InTransit.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn test_any_policy_allows_every_move() {
        let policy = TransitionPolicy::Any;
        assert!(policy.check(OrderStatus::Delivered, OrderStatus::PreparingPackage).is_ok());
        assert!(policy.check(OrderStatus::InTransit, OrderStatus::PreparingPackage).is_ok());
    }

    #[test]
    fn test_forward_policy_rejects_backward_moves() {
        let policy = TransitionPolicy::Forward;
        assert!(policy.check(OrderStatus::PreparingPackage, OrderStatus::InTransit).is_ok());
        assert!(policy.check(OrderStatus::PreparingPackage, OrderStatus::Delivered).is_ok());
        assert!(policy.check(OrderStatus::InTransit, OrderStatus::InTransit).is_ok());
        assert!(matches!(
            policy.check(OrderStatus::Delivered, OrderStatus::InTransit),
            Err(OrderError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::InTransit
            })
        ));
    }

    #[test]
    fn test_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&OrderStatus::InTransit).unwrap();
        assert_eq!(json, "\"IN_TRANSIT\"");
        let back: OrderStatus = serde_json::from_str("\"PREPARING_PACKAGE\"").unwrap();
        assert_eq!(back, OrderStatus::PreparingPackage);
    }

    #[test]
    fn test_display_matches_wire_name() {
        assert_eq!(OrderStatus::Delivered.to_string(), "DELIVERED");
    }
}
