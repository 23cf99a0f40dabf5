//! Whole-voice properties under arbitrary control traffic.

use gendyn_engine::{DistributionKind, Gendy, GendyControls};
use proptest::prelude::*;

/// One control-plane call with an unvalidated argument.
#[derive(Clone, Debug)]
enum Call {
    PointCount(i64),
    MinFrequency(f64),
    MaxFrequency(f64),
    AmpDistribution(u8),
    AmpParam(f64),
    AmpScale(f64),
    DurDistribution(u8),
    DurParam(f64),
    DurScale(f64),
    SampleRate(f64),
    Active(bool),
}

impl Call {
    fn apply(&self, c: &GendyControls) {
        let kind = |v: u8| DistributionKind::from_u8(v % 6).unwrap_or_default();
        match *self {
            Call::PointCount(v) => c.set_point_count(v),
            Call::MinFrequency(v) => c.set_min_frequency(v),
            Call::MaxFrequency(v) => c.set_max_frequency(v),
            Call::AmpDistribution(v) => c.set_amp_distribution(kind(v)),
            Call::AmpParam(v) => c.set_amp_param(v),
            Call::AmpScale(v) => c.set_amp_scale(v),
            Call::DurDistribution(v) => c.set_dur_distribution(kind(v)),
            Call::DurParam(v) => c.set_dur_param(v),
            Call::DurScale(v) => c.set_dur_scale(v),
            Call::SampleRate(v) => c.set_sample_rate(v),
            Call::Active(v) => c.set_active(v),
        }
    }
}

fn real() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1.0e6f64..1.0e6,
        -2.0f64..2.0,
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]
}

fn call() -> impl Strategy<Value = Call> {
    prop_oneof![
        any::<i64>().prop_map(Call::PointCount),
        real().prop_map(Call::MinFrequency),
        real().prop_map(Call::MaxFrequency),
        any::<u8>().prop_map(Call::AmpDistribution),
        real().prop_map(Call::AmpParam),
        real().prop_map(Call::AmpScale),
        any::<u8>().prop_map(Call::DurDistribution),
        real().prop_map(Call::DurParam),
        real().prop_map(Call::DurScale),
        (1.0f64..192_000.0).prop_map(Call::SampleRate),
        any::<bool>().prop_map(Call::Active),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn output_and_state_stay_bounded(seed in any::<u64>(), calls in prop::collection::vec(call(), 1..24)) {
        let mut g = Gendy::with_seed(48_000.0, seed);
        let controls = g.controls();
        let mut out = [0.0f32; 256];

        for c in &calls {
            c.apply(&controls);
            g.render(&mut out);

            prop_assert!(out.iter().all(|y| (-1.0..=1.0).contains(y)));
            let st = g.state();
            prop_assert!((-1.0..=1.0).contains(&st.amp));
            prop_assert!((-1.0..=1.0).contains(&st.next_amp));
            prop_assert!((0.0..=1.0).contains(&st.rate));
            prop_assert!(st.speed >= 0.0);
        }
    }

    #[test]
    fn identical_traffic_renders_identical_bits(seed in any::<u64>(), calls in prop::collection::vec(call(), 1..12)) {
        let mut a = Gendy::with_seed(44_100.0, seed);
        let mut b = Gendy::with_seed(44_100.0, seed);
        let mut oa = [0.0f32; 128];
        let mut ob = [0.0f32; 128];

        for c in &calls {
            c.apply(&a.controls());
            c.apply(&b.controls());
            a.render(&mut oa);
            b.render(&mut ob);
            prop_assert_eq!(oa.map(f32::to_bits), ob.map(f32::to_bits));
        }
    }

    #[test]
    fn dump_reports_what_the_setters_applied(n in any::<i64>(), x in real()) {
        let c = GendyControls::default();
        c.set_point_count(n);
        c.set_amp_param(x);
        c.set_max_frequency(x);
        let d = c.dump();
        prop_assert!((1..=128).contains(&d.point_count));
        prop_assert!((0.0..=1.0).contains(&d.amp_param));
        prop_assert!((1.0e-6..=22_000.0).contains(&d.max_frequency));
    }
}

#[test]
fn controls_from_another_thread_land_by_the_next_block() {
    let mut g = Gendy::with_seed(48_000.0, 99);
    let controls = g.controls();
    let mut out = [0.0f32; 64];
    g.render(&mut out);

    std::thread::spawn(move || {
        controls.set_point_count(3);
        controls.set_active(false);
    })
    .join()
    .expect("control thread");

    g.render(&mut out);
    assert!(out.iter().all(|&y| y == 0.0));
    assert_eq!(g.dump().point_count, 3);
}
