//! Core types for HEALCHAIN
//!
//! Defines fundamental data structures shared by the state store and the fund module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HealchainError;

/// Monetary amount in the smallest currency unit.
///
/// Signed so that a debiting recharge can be expressed; committed balances
/// are kept non-negative by the ledger operations.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Amount(pub i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn new(value: i64) -> Self {
        Amount(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl FromStr for Amount {
    type Err = HealchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Amount)
            .map_err(|e| HealchainError::InvalidArgument(format!("invalid amount {:?}: {}", s, e)))
    }
}

/// Timestamp in seconds since Unix epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(chrono::Utc::now().timestamp())
    }

    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// RFC 3339 rendering, falling back to the raw seconds when out of range
    pub fn to_rfc3339(&self) -> String {
        chrono::DateTime::from_timestamp(self.0, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| self.0.to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Monotonic version of the state store, bumped once per committed batch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct StateVersion(pub u64);

impl StateVersion {
    pub fn new(value: u64) -> Self {
        StateVersion(value)
    }

    pub fn next(&self) -> StateVersion {
        StateVersion(self.0 + 1)
    }

    /// Identifier recorded in key history for writes committed at this version
    pub fn tx_id(&self) -> String {
        format!("tx-{:012}", self.0)
    }
}

impl fmt::Display for StateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Debug for StateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateVersion({})", self.0)
    }
}

/// Identity of the party invoking an operation
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct CallerId(pub String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        CallerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallerId({})", self.0)
    }
}

/// Lifecycle status shared by raise projects and medical bills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Active,
    Completed,
    Expired,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Active => "active",
            Status::Completed => "completed",
            Status::Expired => "expired",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Auditor,
    Institution,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Auditor => "auditor",
            Role::Institution => "institution",
            Role::Admin => "admin",
        };
        f.write_str(s)
    }
}

/// Kind of record an examination decision applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    RaiseProject,
    Institution,
    MedicalBill,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::RaiseProject => "raise_project",
            TargetType::Institution => "institution",
            TargetType::MedicalBill => "medical_bill",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = HealchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raise_project" => Ok(TargetType::RaiseProject),
            "institution" => Ok(TargetType::Institution),
            "medical_bill" => Ok(TargetType::MedicalBill),
            other => Err(HealchainError::InvalidArgument(format!(
                "unknown target type: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_operations() {
        let a = Amount::new(50);
        let b = Amount::new(20);
        assert_eq!(a.checked_sub(b), Some(Amount::new(30)));
        assert_eq!(Amount::new(i64::MAX).checked_add(Amount::new(1)), None);
        assert!(Amount::new(-5).is_negative());
    }

    #[test]
    fn test_amount_parse() {
        assert_eq!(" 35 ".parse::<Amount>().unwrap(), Amount::new(35));
        assert!("abc".parse::<Amount>().is_err());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&Status::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
        let parsed: Status = serde_json::from_str("\"expired\"").unwrap();
        assert_eq!(parsed, Status::Expired);
    }

    #[test]
    fn test_target_type_parse() {
        assert_eq!(
            "medical_bill".parse::<TargetType>().unwrap(),
            TargetType::MedicalBill
        );
        assert!("hospital".parse::<TargetType>().is_err());
    }

    #[test]
    fn test_version_tx_id() {
        let v = StateVersion::new(0).next();
        assert_eq!(v.tx_id(), "tx-000000000001");
    }
}
