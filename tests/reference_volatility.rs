mod fixtures;

use fixtures::{VOLATILITY_14_PATH, assert_near, load_ref_values, load_reference_ohlcvs, reference_series};
use quantedge_upbit::{Volatility, VolatilityConfig, compute_series};
use std::num::NonZero;

/// True ranges here are in the millions of KRW.
const TOLERANCE: f64 = 1e-4;

#[test]
fn volatility_14_matches_reference() {
    let bars = load_reference_ohlcvs();
    let reference = load_ref_values(VOLATILITY_14_PATH);

    let mut vol = Volatility::new(VolatilityConfig::new(NonZero::new(14).unwrap()));

    let mut ref_idx = 0;
    for bar in &bars {
        vol.compute(bar);

        if ref_idx < reference.len() && bar.date == reference[ref_idx].date {
            let value = vol
                .value()
                .unwrap_or_else(|| panic!("volatility returned None at {}", bar.date));
            assert_near(
                value,
                reference[ref_idx].expected,
                TOLERANCE,
                &format!("VOL(14) at bar {ref_idx} ({})", bar.date),
            );
            ref_idx += 1;
        }
    }

    assert_eq!(
        ref_idx,
        reference.len(),
        "not all reference values checked: {ref_idx}/{}",
        reference.len()
    );
}

#[test]
fn volatility_14_series_counts() {
    let series = compute_series::<Volatility>(VolatilityConfig::default(), &reference_series());

    assert_eq!(series.len(), 200);
    assert_eq!(series.defined_count(), 187);
    assert!(series.iter().filter_map(|(_, v)| v).all(|v| v > 0.0));
}
