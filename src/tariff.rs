use crate::error::{Result, WattlyticsError};
use serde::{Deserialize, Serialize};

/// One tier of a slab tariff: units in `[lower, upper)` are billed at `rate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffSlab {
    pub lower: f64,
    /// `None` marks the open-ended top slab
    pub upper: Option<f64>,
    pub rate: f64,
}

impl TariffSlab {
    pub fn new(lower: f64, upper: Option<f64>, rate: f64) -> Self {
        Self { lower, upper, rate }
    }

    /// Units of `total` falling inside this slab
    pub fn billable_units(&self, total: f64) -> f64 {
        let top = match self.upper {
            Some(upper) => total.min(upper),
            None => total,
        };
        (top - self.lower).max(0.0)
    }
}

/// Charge attributed to a single slab for a given consumption
#[derive(Debug, Clone, Serialize)]
pub struct SlabCharge {
    pub lower: f64,
    pub upper: Option<f64>,
    pub rate: f64,
    pub units: f64,
    pub amount: f64,
}

/// Slab table plus fixed charge. Only constructed through validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTariff", into = "RawTariff")]
pub struct Tariff {
    slabs: Vec<TariffSlab>,
    fixed_charge: f64,
}

#[derive(Serialize, Deserialize)]
struct RawTariff {
    slabs: Vec<TariffSlab>,
    fixed_charge: f64,
}

impl TryFrom<RawTariff> for Tariff {
    type Error = WattlyticsError;

    fn try_from(raw: RawTariff) -> Result<Self> {
        Tariff::new(raw.slabs, raw.fixed_charge)
    }
}

impl From<Tariff> for RawTariff {
    fn from(tariff: Tariff) -> Self {
        RawTariff {
            slabs: tariff.slabs,
            fixed_charge: tariff.fixed_charge,
        }
    }
}

impl Default for Tariff {
    /// 0-100 @ 3.0, 100-200 @ 4.5, 200-300 @ 6.0, 300+ @ 8.0, fixed charge 50
    fn default() -> Self {
        Self {
            slabs: vec![
                TariffSlab::new(0.0, Some(100.0), 3.0),
                TariffSlab::new(100.0, Some(200.0), 4.5),
                TariffSlab::new(200.0, Some(300.0), 6.0),
                TariffSlab::new(300.0, None, 8.0),
            ],
            fixed_charge: 50.0,
        }
    }
}

impl Tariff {
    pub fn new(slabs: Vec<TariffSlab>, fixed_charge: f64) -> Result<Self> {
        validate_slabs(&slabs)?;
        if !fixed_charge.is_finite() || fixed_charge < 0.0 {
            return Err(WattlyticsError::config_error(&format!(
                "fixed charge must be a non-negative number, got {}",
                fixed_charge
            )));
        }
        Ok(Self {
            slabs,
            fixed_charge,
        })
    }

    /// Build a table from ascending upper edges and one more rate than edges.
    /// `from_rates(&[100.0, 200.0], &[5.0, 7.0, 10.0], 50.0)` yields
    /// 0-100 @ 5, 100-200 @ 7, 200+ @ 10.
    pub fn from_rates(edges: &[f64], rates: &[f64], fixed_charge: f64) -> Result<Self> {
        if rates.len() != edges.len() + 1 {
            return Err(WattlyticsError::config_error(&format!(
                "expected {} rates for {} slab edges, got {}",
                edges.len() + 1,
                edges.len(),
                rates.len()
            )));
        }

        let mut slabs = Vec::with_capacity(rates.len());
        let mut lower = 0.0;
        for (i, rate) in rates.iter().enumerate() {
            let upper = edges.get(i).copied();
            slabs.push(TariffSlab::new(lower, upper, *rate));
            if let Some(upper) = upper {
                lower = upper;
            }
        }

        Self::new(slabs, fixed_charge)
    }

    /// Parse `"100:3.0,200:4.5,300:6.0,*:8.0"`: `edge:rate` pairs, `*` for the open slab
    pub fn parse_slab_spec(spec: &str, fixed_charge: f64) -> Result<Self> {
        let mut edges = Vec::new();
        let mut rates = Vec::new();

        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (edge, rate) = part.split_once(':').ok_or_else(|| {
                WattlyticsError::config_error(&format!(
                    "slab '{}' must look like <upper>:<rate>",
                    part
                ))
            })?;
            let rate: f64 = rate.trim().parse().map_err(|_| {
                WattlyticsError::config_error(&format!("invalid rate '{}'", rate.trim()))
            })?;
            rates.push(rate);

            let edge = edge.trim();
            if edge == "*" {
                continue;
            }
            let edge: f64 = edge.parse().map_err(|_| {
                WattlyticsError::config_error(&format!("invalid slab edge '{}'", edge))
            })?;
            edges.push(edge);
        }

        if rates.is_empty() {
            return Err(WattlyticsError::config_error("tariff has no slabs"));
        }
        if rates.len() == edges.len() {
            return Err(WattlyticsError::config_error(
                "the last slab must be open-ended ('*:<rate>')",
            ));
        }

        Self::from_rates(&edges, &rates, fixed_charge)
    }

    pub fn slabs(&self) -> &[TariffSlab] {
        &self.slabs
    }

    pub fn fixed_charge(&self) -> f64 {
        self.fixed_charge
    }

    /// Bill for a month's consumption, rounded to cents
    pub fn compute_bill(&self, units: f64) -> f64 {
        let units = sanitize_units(units);
        let energy: f64 = self
            .slabs
            .iter()
            .map(|slab| slab.billable_units(units) * slab.rate)
            .sum();
        round_currency(energy + self.fixed_charge)
    }

    /// Per-slab split of the energy charge (fixed charge excluded)
    pub fn slab_breakdown(&self, units: f64) -> Vec<SlabCharge> {
        let units = sanitize_units(units);
        self.slabs
            .iter()
            .map(|slab| {
                let billed = slab.billable_units(units);
                SlabCharge {
                    lower: slab.lower,
                    upper: slab.upper,
                    rate: slab.rate,
                    units: billed,
                    amount: billed * slab.rate,
                }
            })
            .collect()
    }

    /// Rate applied to the next unit consumed at `units`
    pub fn marginal_rate(&self, units: f64) -> f64 {
        let units = sanitize_units(units);
        self.slabs
            .iter()
            .find(|slab| slab.upper.is_none_or(|upper| units < upper))
            .or(self.slabs.last())
            .map(|slab| slab.rate)
            .unwrap_or(0.0)
    }
}

fn validate_slabs(slabs: &[TariffSlab]) -> Result<()> {
    let Some(first) = slabs.first() else {
        return Err(WattlyticsError::config_error(
            "tariff must have at least one slab",
        ));
    };
    if first.lower != 0.0 {
        return Err(WattlyticsError::config_error(&format!(
            "first slab must start at 0 units, starts at {}",
            first.lower
        )));
    }

    for (i, slab) in slabs.iter().enumerate() {
        if !slab.rate.is_finite() || slab.rate < 0.0 {
            return Err(WattlyticsError::config_error(&format!(
                "slab {} has invalid rate {}",
                i + 1,
                slab.rate
            )));
        }

        match slab.upper {
            Some(upper) => {
                if !upper.is_finite() || upper <= slab.lower {
                    return Err(WattlyticsError::config_error(&format!(
                        "slab {} upper edge {} must be above its lower edge {}",
                        i + 1,
                        upper,
                        slab.lower
                    )));
                }
                match slabs.get(i + 1) {
                    Some(next) if next.lower != upper => {
                        return Err(WattlyticsError::config_error(&format!(
                            "slab {} starts at {} but slab {} ends at {}",
                            i + 2,
                            next.lower,
                            i + 1,
                            upper
                        )));
                    }
                    Some(_) => {}
                    None => {
                        return Err(WattlyticsError::config_error(
                            "the last slab must have no upper edge",
                        ));
                    }
                }
            }
            None if i + 1 != slabs.len() => {
                return Err(WattlyticsError::config_error(&format!(
                    "slab {} is open-ended but is not the last slab",
                    i + 1
                )));
            }
            None => {}
        }
    }

    Ok(())
}

fn sanitize_units(units: f64) -> f64 {
    if units.is_finite() { units.max(0.0) } else { 0.0 }
}

pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_tariff() -> Tariff {
        Tariff::new(
            vec![
                TariffSlab::new(0.0, Some(100.0), 5.0),
                TariffSlab::new(100.0, Some(200.0), 7.0),
                TariffSlab::new(200.0, None, 10.0),
            ],
            50.0,
        )
        .unwrap()
    }

    #[test]
    fn test_scenario_bill() {
        assert_eq!(scenario_tariff().compute_bill(250.0), 1750.0);
    }

    #[test]
    fn test_zero_units_is_fixed_charge() {
        assert_eq!(scenario_tariff().compute_bill(0.0), 50.0);
        assert_eq!(Tariff::default().compute_bill(0.0), 50.0);
    }

    #[test]
    fn test_default_tariff_matches_slab_rates() {
        let tariff = Tariff::default();
        assert_eq!(tariff.compute_bill(80.0), 50.0 + 240.0);
        assert_eq!(tariff.compute_bill(150.0), 50.0 + 300.0 + 225.0);
        assert_eq!(tariff.compute_bill(250.0), 50.0 + 300.0 + 450.0 + 300.0);
        assert_eq!(
            tariff.compute_bill(380.0),
            50.0 + 300.0 + 450.0 + 600.0 + 640.0
        );
    }

    #[test]
    fn test_bill_is_monotonic() {
        for tariff in [Tariff::default(), scenario_tariff()] {
            let mut previous = tariff.compute_bill(0.0);
            for step in 1..=1000 {
                let bill = tariff.compute_bill(step as f64 * 0.7);
                assert!(bill >= previous, "bill dropped at {} units", step as f64 * 0.7);
                previous = bill;
            }
        }
    }

    #[test]
    fn test_slab_breakdown_sums_to_energy_charge() {
        let tariff = scenario_tariff();
        for units in [0.0, 42.5, 100.0, 199.9, 250.0, 1234.0] {
            let slab_total: f64 = tariff.slab_breakdown(units).iter().map(|c| c.amount).sum();
            let energy = tariff.compute_bill(units) - tariff.fixed_charge();
            assert!((slab_total - energy).abs() < 0.01, "mismatch at {}", units);
        }

        let breakdown = tariff.slab_breakdown(250.0);
        assert_eq!(breakdown[0].units, 100.0);
        assert_eq!(breakdown[1].units, 100.0);
        assert_eq!(breakdown[2].units, 50.0);
    }

    #[test]
    fn test_negative_units_bill_as_zero() {
        assert_eq!(Tariff::default().compute_bill(-10.0), 50.0);
        assert_eq!(Tariff::default().compute_bill(f64::NAN), 50.0);
    }

    #[test]
    fn test_rejects_invalid_tables() {
        // empty
        assert!(matches!(
            Tariff::new(vec![], 0.0),
            Err(WattlyticsError::Configuration { .. })
        ));
        // unordered
        assert!(
            Tariff::new(
                vec![
                    TariffSlab::new(0.0, Some(200.0), 3.0),
                    TariffSlab::new(100.0, None, 4.0),
                ],
                0.0
            )
            .is_err()
        );
        // negative rate
        assert!(Tariff::new(vec![TariffSlab::new(0.0, None, -1.0)], 0.0).is_err());
        // bounded last slab
        assert!(Tariff::new(vec![TariffSlab::new(0.0, Some(100.0), 1.0)], 0.0).is_err());
        // not starting at zero
        assert!(Tariff::new(vec![TariffSlab::new(10.0, None, 1.0)], 0.0).is_err());
        // negative fixed charge
        assert!(Tariff::new(vec![TariffSlab::new(0.0, None, 1.0)], -5.0).is_err());
    }

    #[test]
    fn test_from_rates() {
        let tariff = Tariff::from_rates(&[100.0, 200.0], &[5.0, 7.0, 10.0], 50.0).unwrap();
        assert_eq!(tariff, scenario_tariff());
        assert!(Tariff::from_rates(&[100.0], &[5.0], 0.0).is_err());
        assert!(Tariff::from_rates(&[200.0, 100.0], &[1.0, 2.0, 3.0], 0.0).is_err());
    }

    #[test]
    fn test_parse_slab_spec() {
        let tariff = Tariff::parse_slab_spec("100:5, 200:7, *:10", 50.0).unwrap();
        assert_eq!(tariff.compute_bill(250.0), 1750.0);

        assert!(Tariff::parse_slab_spec("100:5,200:7", 50.0).is_err());
        assert!(Tariff::parse_slab_spec("100-5,*:7", 50.0).is_err());
        assert!(Tariff::parse_slab_spec("", 50.0).is_err());
        assert!(Tariff::parse_slab_spec("100:abc,*:7", 50.0).is_err());
    }

    #[test]
    fn test_marginal_rate() {
        let tariff = Tariff::default();
        assert_eq!(tariff.marginal_rate(0.0), 3.0);
        assert_eq!(tariff.marginal_rate(100.0), 4.5);
        assert_eq!(tariff.marginal_rate(299.0), 6.0);
        assert_eq!(tariff.marginal_rate(1000.0), 8.0);
    }

    #[test]
    fn test_yaml_deserialization_validates() {
        let yaml = "slabs:\n  - {lower: 0, upper: 100, rate: 2}\n  - {lower: 100, upper: null, rate: 3}\nfixed_charge: 10\n";
        let tariff: Tariff = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(tariff.compute_bill(150.0), 10.0 + 200.0 + 150.0);

        let bad = "slabs:\n  - {lower: 0, upper: 100, rate: -2}\n  - {lower: 100, upper: null, rate: 3}\nfixed_charge: 10\n";
        assert!(serde_yaml::from_str::<Tariff>(bad).is_err());
    }
}
