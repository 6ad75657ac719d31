//! Status enums for orders, payments, and shipping.
//!
//! The payment processor reports uppercase statuses (`COMPLETED`, `FAILED`,
//! `PENDING`, `CANCELLED`) while stored orders use lowercase ones. All
//! conversion happens here, once, at the system boundary - handlers never
//! compare raw status strings.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a stored order.
///
/// There are no further substates: an order is `created` at checkout start,
/// `pending` once a payment transaction exists, and ends `completed` or
/// `cancelled` when the processor reports an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Created,
    Pending,
    Completed,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment outcome as reported by the processor.
///
/// Parsed case-sensitively from the processor's uppercase wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessorStatus {
    Completed,
    Failed,
    Pending,
    Cancelled,
}

impl ProcessorStatus {
    /// The uppercase wire form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Pending => "PENDING",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Convert the processor outcome into the stored order status.
    ///
    /// `FAILED` maps to `cancelled`: the order status set is closed and a
    /// failed payment leaves the order in a terminal non-completed state.
    #[must_use]
    pub const fn order_status(&self) -> OrderStatus {
        match self {
            Self::Completed => OrderStatus::Completed,
            Self::Pending => OrderStatus::Pending,
            Self::Failed | Self::Cancelled => OrderStatus::Cancelled,
        }
    }
}

impl std::fmt::Display for ProcessorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProcessorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "PENDING" => Ok(Self::Pending),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid processor status: {s}")),
        }
    }
}

/// How an order is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    /// Ship to the customer's address. Street/city/postal fields required.
    Shipping,
    /// Pickup in store. No address fields are collected or transmitted.
    Pickup,
}

impl std::fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shipping => write!(f, "shipping"),
            Self::Pickup => write!(f, "pickup"),
        }
    }
}
