//! Order status state machine.
//!
//! Legal transitions live in a static table checked by a pure function; the
//! status values carry no behavior beyond the table lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Initial status of every order.
    Created,
    /// Awaiting payment authorization.
    PaymentPending,
    /// Payment authorized.
    PaymentConfirmed,
    /// Being picked and packed.
    Processing,
    /// Terminal: fulfilled.
    Completed,
    /// Terminal: cancelled.
    Cancelled,
}

impl OrderStatus {
    /// Returns the set of statuses this status may transition to.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Created => &[Self::PaymentPending, Self::Cancelled],
            Self::PaymentPending => &[Self::PaymentConfirmed, Self::Cancelled],
            Self::PaymentConfirmed => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    /// Returns true when the edge `self -> to` is permitted.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Returns true when no further transition is permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns the storage representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::PaymentPending => "PAYMENT_PENDING",
            Self::PaymentConfirmed => "PAYMENT_CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(Self::Created),
            "PAYMENT_PENDING" => Some(Self::PaymentPending),
            "PAYMENT_CONFIRMED" => Some(Self::PaymentConfirmed),
            "PROCESSING" => Some(Self::Processing),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
