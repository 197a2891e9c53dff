use ndarray::{Array2, Axis};
use proptest::prelude::*;
use rotor_ensemble::stats::{confidence_band, percentile, summarize};
use rotor_ensemble::BandRequest;

fn ensemble() -> impl Strategy<Value = Array2<f64>> {
    (1usize..6, 1usize..20).prop_flat_map(|(points, samples)| {
        prop::collection::vec(-1.0e6..1.0e6f64, points * samples).prop_map(move |flat| {
            Array2::from_shape_vec((points, samples), flat).expect("shape matches length")
        })
    })
}

proptest! {
    #[test]
    fn band_lower_never_exceeds_upper(data in ensemble(), level in 0.0..=100.0f64) {
        let band = confidence_band(data.view(), level, Axis(1)).unwrap();
        for (lo, hi) in band.lower.iter().zip(&band.upper) {
            prop_assert!(lo <= hi);
        }
    }

    #[test]
    fn percentiles_stay_within_sample_range(
        values in prop::collection::vec(-1.0e3..1.0e3f64, 1..50),
        p in 0.0..=100.0f64,
    ) {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let q = percentile(&values, p).unwrap();
        prop_assert!(min <= q && q <= max);
    }

    #[test]
    fn percentile_curves_are_monotone_in_level(data in ensemble(), a in 0.0..=100.0f64, b in 0.0..=100.0f64) {
        let request = BandRequest::new(&[a, b], &[]).unwrap();
        let summary = summarize(data.view(), Axis(1), &request, "prop").unwrap();
        if let [low, high] = summary.percentiles.as_slice() {
            for (l, h) in low.values.iter().zip(&high.values) {
                prop_assert!(l <= h);
            }
        }
    }
}
