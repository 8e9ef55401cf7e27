use crate::analytics::AnalyticsSummary;
use crate::tariff::round_currency;
use serde::Serialize;

const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// When a catalog tip applies to a household
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TipRule {
    Always,
    AvgUnitsAbove(f64),
    PeakUnitsAbove(f64),
}

impl TipRule {
    pub fn applies(&self, summary: &AnalyticsSummary) -> bool {
        match *self {
            TipRule::Always => true,
            TipRule::AvgUnitsAbove(limit) => summary.avg_units > limit,
            TipRule::PeakUnitsAbove(limit) => summary.peak_units > limit,
        }
    }
}

/// Static catalog entry
#[derive(Debug, Clone, Copy)]
pub struct TipTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub action: &'static str,
    pub priority: Priority,
    pub rule: TipRule,
    pub savings_fraction: f64,
}

pub const TIP_CATALOG: &[TipTemplate] = &[
    TipTemplate {
        name: "High Consumption Alert",
        description: "Your consumption is well above a typical household",
        action: "Set AC to 24-26°C instead of lower temperatures",
        priority: Priority::High,
        rule: TipRule::AvgUnitsAbove(300.0),
        savings_fraction: 0.15,
    },
    TipTemplate {
        name: "Optimize AC Usage",
        description: "AC consumes 40-50% of a peak-month bill",
        action: "Use AC only in occupied rooms, close doors and windows",
        priority: Priority::High,
        rule: TipRule::PeakUnitsAbove(250.0),
        savings_fraction: 0.12,
    },
    TipTemplate {
        name: "Switch to LED Bulbs",
        description: "LED bulbs use 75% less energy",
        action: "Replace all traditional bulbs with LED",
        priority: Priority::Medium,
        rule: TipRule::Always,
        savings_fraction: 0.08,
    },
    TipTemplate {
        name: "Water Heater Timer",
        description: "Water heaters consume 15-20% of electricity",
        action: "Use a timer and heat only 30 minutes before use",
        priority: Priority::Medium,
        rule: TipRule::Always,
        savings_fraction: 0.07,
    },
    TipTemplate {
        name: "Unplug Devices",
        description: "Phantom load can waste 5-10% energy",
        action: "Turn off devices at night, unplug chargers",
        priority: Priority::Low,
        rule: TipRule::Always,
        savings_fraction: 0.04,
    },
    TipTemplate {
        name: "Regular Maintenance",
        description: "Dirty AC filters increase consumption",
        action: "Clean AC filters monthly, service annually",
        priority: Priority::Low,
        rule: TipRule::Always,
        savings_fraction: 0.05,
    },
];

/// An applicable tip with its estimated savings
#[derive(Debug, Clone, Serialize)]
pub struct Tip {
    pub name: String,
    pub description: String,
    pub action: String,
    pub priority: Priority,
    pub savings_fraction: f64,
    pub monthly_savings: f64,
    pub yearly_savings: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SavingsTotals {
    pub monthly: f64,
    pub yearly: f64,
}

pub fn recommend(summary: &AnalyticsSummary) -> Vec<Tip> {
    recommend_from(TIP_CATALOG, summary)
}

/// Catalog order is output order; tips whose rule fails are left out
pub fn recommend_from(catalog: &[TipTemplate], summary: &AnalyticsSummary) -> Vec<Tip> {
    catalog
        .iter()
        .filter(|template| template.rule.applies(summary))
        .map(|template| {
            let monthly = summary.avg_amount * template.savings_fraction;
            Tip {
                name: template.name.to_string(),
                description: template.description.to_string(),
                action: template.action.to_string(),
                priority: template.priority,
                savings_fraction: template.savings_fraction,
                monthly_savings: round_currency(monthly),
                yearly_savings: round_currency(monthly * MONTHS_PER_YEAR),
            }
        })
        .collect()
}

pub fn total_savings(tips: &[Tip]) -> SavingsTotals {
    tips.iter()
        .fold(SavingsTotals::default(), |mut acc, tip| {
            acc.monthly += tip.monthly_savings;
            acc.yearly += tip.yearly_savings;
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::TrendDirection;

    fn summary(avg_units: f64, peak_units: f64, avg_amount: f64) -> AnalyticsSummary {
        AnalyticsSummary {
            record_count: 3,
            avg_units,
            avg_amount,
            peak_units,
            peak_period: "Mar".to_string(),
            lowest_units: avg_units,
            lowest_period: "Jan".to_string(),
            total_units: avg_units * 3.0,
            total_amount: avg_amount * 3.0,
            cost_per_unit: 0.0,
            trend: vec![],
            trend_percent: 0.0,
            trend_direction: TrendDirection::Stable,
            high_consumption_threshold: 0.2,
        }
    }

    fn names(tips: &[Tip]) -> Vec<&str> {
        tips.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_low_usage_gets_only_general_tips() {
        let tips = recommend(&summary(150.0, 200.0, 600.0));
        assert_eq!(
            names(&tips),
            vec![
                "Switch to LED Bulbs",
                "Water Heater Timer",
                "Unplug Devices",
                "Regular Maintenance"
            ]
        );
    }

    #[test]
    fn test_peak_triggers_ac_tip() {
        let tips = recommend(&summary(200.0, 320.0, 1000.0));
        assert_eq!(tips[0].name, "Optimize AC Usage");
        assert_eq!(tips[0].priority, Priority::High);
        assert_eq!(tips.len(), 5);
    }

    #[test]
    fn test_heavy_usage_gets_every_tip() {
        let tips = recommend(&summary(350.0, 400.0, 2000.0));
        assert_eq!(tips.len(), TIP_CATALOG.len());
        assert_eq!(tips[0].name, "High Consumption Alert");
    }

    #[test]
    fn test_savings_scale_with_average_bill() {
        let tips = recommend(&summary(150.0, 200.0, 1000.0));
        let led = &tips[0];
        assert_eq!(led.monthly_savings, 80.0);
        assert_eq!(led.yearly_savings, 960.0);

        let totals = total_savings(&tips);
        assert!((totals.monthly - 240.0).abs() < 1e-9);
        assert!((totals.yearly - 2880.0).abs() < 1e-9);
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let s = summary(283.33, 320.0, 1766.67);
        let first = recommend(&s);
        let second = recommend(&s);
        assert_eq!(names(&first), names(&second));
        assert_eq!(
            first.iter().map(|t| t.monthly_savings).collect::<Vec<_>>(),
            second.iter().map(|t| t.monthly_savings).collect::<Vec<_>>()
        );
    }
}
