use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Order {
    pub id: i64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub typeoforder_name: Option<String>,
    #[serde(default)]
    pub numberpeople: u32,
    #[serde(default)]
    pub totalprice: f64,
}

impl Order {
    /// Order date, accepting either a full timestamp or a plain date.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|d| d.with_timezone(&Utc).date_naive())
            .ok()
            .or_else(|| raw.get(..10).and_then(|d| d.parse().ok()))
    }
}

/// Totals shown above the order history and in the navigation badge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct OrderSummary {
    pub count: usize,
    pub total_amount: f64,
    pub total_people: u32,
    pub latest: Option<NaiveDate>,
}

impl OrderSummary {
    pub fn from_orders(orders: &[Order]) -> Self {
        Self {
            count: orders.len(),
            total_amount: orders.iter().map(|o| o.totalprice).sum(),
            total_people: orders.iter().map(|o| o.numberpeople).sum(),
            latest: orders.iter().filter_map(Order::parsed_date).max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> Vec<Order> {
        serde_json::from_str(
            r#"[
                {"id": 1, "date": "2026-09-01T08:30:00.000Z", "typeoforder_name": "Online", "numberpeople": 2, "totalprice": 300.0},
                {"id": 2, "date": "2026-10-05", "numberpeople": 4, "totalprice": 1250.5},
                {"id": 3, "totalprice": 99.5}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_summary_totals() {
        let summary = OrderSummary::from_orders(&orders());
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total_amount, 1650.0);
        assert_eq!(summary.total_people, 6);
        assert_eq!(summary.latest, Some(NaiveDate::from_ymd_opt(2026, 10, 5).unwrap()));
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(OrderSummary::from_orders(&[]), OrderSummary::default());
    }

    #[test]
    fn test_parsed_date_formats() {
        let orders = orders();
        assert_eq!(orders[0].parsed_date(), NaiveDate::from_ymd_opt(2026, 9, 1));
        assert_eq!(orders[2].parsed_date(), None);
    }
}
