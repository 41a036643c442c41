use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Order identifier as rendered on a card. Numeric ids travel as JSON numbers,
/// anything else (e.g. `PO-1052`) as a string. A digits-only string decodes to
/// the numeric form, so `42` and `"42"` name the same order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum OrderId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl OrderId {
    fn from_text(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(id) => Self::Numeric(id),
            Err(_) => Self::Text(raw.to_string()),
        }
    }
}

impl FromStr for OrderId {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_text(raw))
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Numeric(i64),
            Text(String),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Numeric(id) => Self::Numeric(id),
            Wire::Text(raw) => Self::from_text(&raw),
        })
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NewOrder,
    UnderBooking,
    Booked,
    ReceivedContract,
}

impl Status {
    /// Board column order.
    pub const ALL: [Status; 4] = [
        Status::NewOrder,
        Status::UnderBooking,
        Status::Booked,
        Status::ReceivedContract,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewOrder => "new_order",
            Self::UnderBooking => "under_booking",
            Self::Booked => "booked",
            Self::ReceivedContract => "received_contract",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NewOrder => "New Order",
            Self::UnderBooking => "Under Booking",
            Self::Booked => "Booked",
            Self::ReceivedContract => "Received Contract",
        }
    }

    pub fn css_class(self) -> String {
        format!("status-{}", self.as_str().replace('_', "-"))
    }

    pub fn column_index(self) -> usize {
        match self {
            Self::NewOrder => 0,
            Self::UnderBooking => 1,
            Self::Booked => 2,
            Self::ReceivedContract => 3,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    /// Accepts the wire form (`under_booking`), the CSS class
    /// (`status-under-booking`), the kebab form and the display label.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        let normalized = normalized.strip_prefix("status-").unwrap_or(&normalized);
        let normalized = normalized.replace(['-', ' '], "_");
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayData {
    pub customer_name: String,
    pub amount: String,
    pub yarn_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub order_id: OrderId,
    pub status: Status,
    #[serde(default)]
    pub display: DisplayData,
}

impl Card {
    pub fn new(order_id: impl Into<OrderId>, status: Status) -> Self {
        Self {
            order_id: order_id.into(),
            status,
            display: DisplayData::default(),
        }
    }

    pub fn with_display(mut self, display: DisplayData) -> Self {
        self.display = display;
        self
    }

    /// Card amount as a number, ignoring `$` and thousands separators.
    pub fn amount_value(&self) -> Option<f64> {
        let cleaned: String = self
            .display
            .amount
            .chars()
            .filter(|c| !matches!(c, '$' | ','))
            .collect();
        cleaned
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }

    /// Lower-cased haystack used by board search.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.order_id, self.display.customer_name, self.display.yarn_type, self.display.amount
        )
        .to_lowercase()
    }
}
