use crate::helpers::compare_floats;
use crate::tariff::{Tariff, round_currency};
use serde::Serialize;

/// Ratio over the typical value above which a household uses notably more
const MORE_THAN_TYPICAL: f64 = 1.2;
/// Ratio under the typical value below which a household uses notably less
const LESS_THAN_TYPICAL: f64 = 0.8;

/// Typical monthly consumption range for a household category
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HouseholdBenchmark {
    pub category: &'static str,
    pub min_units: f64,
    pub max_units: f64,
}

impl HouseholdBenchmark {
    pub fn typical_units(&self) -> f64 {
        (self.min_units + self.max_units) / 2.0
    }
}

pub const HOUSEHOLD_BENCHMARKS: &[HouseholdBenchmark] = &[
    HouseholdBenchmark {
        category: "Small Apartment (1-2 BHK)",
        min_units: 50.0,
        max_units: 150.0,
    },
    HouseholdBenchmark {
        category: "Medium Apartment (2-3 BHK)",
        min_units: 150.0,
        max_units: 300.0,
    },
    HouseholdBenchmark {
        category: "Large Apartment (3+ BHK)",
        min_units: 300.0,
        max_units: 400.0,
    },
    HouseholdBenchmark {
        category: "Independent House",
        min_units: 400.0,
        max_units: 600.0,
    },
];

/// Where the user's average sits relative to a benchmark range
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum RangePosition {
    Below,
    Within,
    Above,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub category: String,
    pub typical_units: f64,
    pub min_units: f64,
    pub max_units: f64,
    pub position: RangePosition,
    /// Average is above the category's typical (midpoint) consumption
    pub user_above_average: bool,
    /// Average minus typical consumption
    pub delta_units: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ProfileVerdict {
    MoreThanTypical,
    Typical,
    LessThanTypical,
}

/// Closest matching household type and how far the user is from it
#[derive(Debug, Clone, Serialize)]
pub struct HouseholdProfile {
    pub category: String,
    pub typical_units: f64,
    pub verdict: ProfileVerdict,
    /// Percent above (positive) or below (negative) the typical value
    pub difference_percent: f64,
    /// Monthly bill reduction from dropping to typical usage; 0 unless above
    pub potential_monthly_savings: f64,
}

pub fn compare(avg_units: f64) -> Vec<ComparisonResult> {
    compare_against(HOUSEHOLD_BENCHMARKS, avg_units)
}

pub fn compare_against(benchmarks: &[HouseholdBenchmark], avg_units: f64) -> Vec<ComparisonResult> {
    benchmarks
        .iter()
        .map(|benchmark| {
            let typical = benchmark.typical_units();
            let position = if avg_units < benchmark.min_units {
                RangePosition::Below
            } else if avg_units > benchmark.max_units {
                RangePosition::Above
            } else {
                RangePosition::Within
            };
            let delta_units = avg_units - typical;

            ComparisonResult {
                category: benchmark.category.to_string(),
                typical_units: typical,
                min_units: benchmark.min_units,
                max_units: benchmark.max_units,
                position,
                user_above_average: delta_units > 0.0,
                delta_units,
            }
        })
        .collect()
}

pub fn closest_profile(avg_units: f64, tariff: &Tariff) -> Option<HouseholdProfile> {
    closest_profile_in(HOUSEHOLD_BENCHMARKS, avg_units, tariff)
}

pub fn closest_profile_in(
    benchmarks: &[HouseholdBenchmark],
    avg_units: f64,
    tariff: &Tariff,
) -> Option<HouseholdProfile> {
    let closest = benchmarks.iter().min_by(|a, b| {
        compare_floats(
            (a.typical_units() - avg_units).abs(),
            (b.typical_units() - avg_units).abs(),
        )
    })?;

    let typical = closest.typical_units();
    let difference_percent = if typical > 0.0 {
        (avg_units / typical - 1.0) * 100.0
    } else {
        0.0
    };

    let (verdict, potential_monthly_savings) = if avg_units > typical * MORE_THAN_TYPICAL {
        let excess = avg_units - typical;
        (
            ProfileVerdict::MoreThanTypical,
            round_currency(excess * tariff.marginal_rate(avg_units)),
        )
    } else if avg_units < typical * LESS_THAN_TYPICAL {
        (ProfileVerdict::LessThanTypical, 0.0)
    } else {
        (ProfileVerdict::Typical, 0.0)
    };

    Some(HouseholdProfile {
        category: closest.category.to_string(),
        typical_units: typical,
        verdict,
        difference_percent,
        potential_monthly_savings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_for<'a>(results: &'a [ComparisonResult], prefix: &str) -> &'a ComparisonResult {
        results
            .iter()
            .find(|r| r.category.starts_with(prefix))
            .unwrap()
    }

    #[test]
    fn test_scenario_average_against_benchmarks() {
        let results = compare(283.33);
        assert_eq!(results.len(), HOUSEHOLD_BENCHMARKS.len());

        let medium = result_for(&results, "Medium");
        assert_eq!(medium.position, RangePosition::Within);

        let small = result_for(&results, "Small");
        assert_eq!(small.position, RangePosition::Above);
        assert!(small.user_above_average);
        assert!((small.delta_units - 183.33).abs() < 0.01);

        let house = result_for(&results, "Independent");
        assert_eq!(house.position, RangePosition::Below);
        assert!(!house.user_above_average);
    }

    #[test]
    fn test_range_edges_are_inclusive() {
        let results = compare(150.0);
        assert_eq!(result_for(&results, "Small").position, RangePosition::Within);
        assert_eq!(result_for(&results, "Medium").position, RangePosition::Within);
    }

    #[test]
    fn test_missing_categories_are_not_compared() {
        assert!(compare_against(&[], 200.0).is_empty());
        assert!(closest_profile_in(&[], 200.0, &Tariff::default()).is_none());
    }

    #[test]
    fn test_closest_profile_verdicts() {
        let tariff = Tariff::default();

        let typical = closest_profile(230.0, &tariff).unwrap();
        assert!(typical.category.starts_with("Medium"));
        assert_eq!(typical.verdict, ProfileVerdict::Typical);
        assert_eq!(typical.potential_monthly_savings, 0.0);

        // Closest to Small (typical 100); 130 > 120
        let above = closest_profile(130.0, &tariff).unwrap();
        assert!(above.category.starts_with("Small"));
        assert_eq!(above.verdict, ProfileVerdict::MoreThanTypical);
        assert!((above.difference_percent - 30.0).abs() < 1e-9);
        assert_eq!(above.potential_monthly_savings, 30.0 * 4.5);

        let below = closest_profile(20.0, &tariff).unwrap();
        assert_eq!(below.verdict, ProfileVerdict::LessThanTypical);
    }
}
