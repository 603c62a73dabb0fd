use fen_tdigest::tdigest::test_helpers::{
    assert_abs_close, assert_exact, exact_cdf, exact_quantile,
};
use fen_tdigest::{DigestOptions, TDigest, TdError, WireError};
use tdigest_testdata::{gen_stream, round_robin, shuffled, sorted, StreamKind};

fn digest(compression: f64, seed: u64) -> TDigest {
    TDigest::with_seed(compression, seed).expect("valid compression")
}

#[test]
fn empty_single_and_pair_scenarios() {
    let mut d = digest(100.0, 1);
    assert!(d.quantile(0.1).is_nan());
    assert!(d.cdf(1.0).is_nan());
    assert_eq!(d.min(), None);

    d.insert(0.4).expect("insert");
    assert_exact("quantile(0.1)", 0.4, d.quantile(0.1));
    assert_exact("cdf(0.3)", 0.0, d.cdf(0.3));
    assert_exact("cdf(0.5)", 1.0, d.cdf(0.5));

    d.insert(0.5).expect("insert");
    assert_eq!(d.centroid_count(), 2);

    assert!(matches!(
        d.insert_weighted(0.0, 0),
        Err(TdError::ZeroWeight { .. })
    ));
}

#[test]
fn integer_scenarios() {
    let mut d = digest(100.0, 2);
    d.insert_many([1.0, 2.0, 3.0]).expect("insert");
    assert_exact("p50 of 1,2,3", 2.0, d.quantile(0.5));

    let mut d = digest(100.0, 3);
    d.insert_many([1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 3.0])
        .expect("insert");
    assert_exact("p50", 2.0, d.quantile(0.5));

    let mut total = 0u32;
    d.for_each_centroid(|_, w| {
        total += w;
        true
    });
    assert_eq!(total, 9);
}

#[test]
fn uniform_accuracy_tightens_toward_the_tails() {
    let mut d = digest(100.0, 4);
    d.insert_many(gen_stream(StreamKind::Uniform, 100_000, 4))
        .expect("insert");
    assert_eq!(d.total_weight(), 100_000);

    for (q, tol) in [
        (0.5, 0.02),
        (0.1, 0.01),
        (0.9, 0.01),
        (0.01, 0.005),
        (0.99, 0.005),
        (0.001, 0.001),
        (0.999, 0.001),
    ] {
        assert_abs_close(&format!("q={q}"), q, d.quantile(q), tol);
    }
}

#[test]
fn permuted_insertion_tracks_exact_quantiles() {
    let data = gen_stream(StreamKind::Permuted, 1_000, 0);
    let max = data.len() as f64;
    let mut d = digest(100.0, 5);
    let mut seen = Vec::with_capacity(data.len());

    for (i, &v) in data.iter().enumerate() {
        d.insert(v).expect("insert");
        seen.push(v);
        if i == 0 {
            continue;
        }
        // Small prefixes have meaningless tails; loosen accordingly.
        let fac = 1.0 + max / i as f64;
        let ordered = sorted(&seen);
        for (q, slope) in [
            (0.001, 0.001),
            (0.01, 0.005),
            (0.05, 0.01),
            (0.25, 0.01),
            (0.5, 0.02),
            (0.75, 0.01),
            (0.95, 0.01),
            (0.99, 0.005),
            (0.999, 0.001),
        ] {
            assert_abs_close(
                &format!("i={i} q={q}"),
                exact_quantile(&ordered, q),
                d.quantile(q),
                fac + slope * max,
            );
        }
    }
}

#[test]
fn weighted_samples_behave_like_repeats() {
    let mut d = digest(10.0, 6);
    let mut data = Vec::new();
    for i in 1..100u32 {
        d.insert_weighted(f64::from(i), i).expect("insert");
        data.extend(std::iter::repeat(f64::from(i)).take(i as usize));
    }
    assert_eq!(d.total_weight() as usize, data.len());

    for (q, slope) in [
        (0.001, 0.001),
        (0.01, 0.005),
        (0.05, 0.01),
        (0.25, 0.01),
        (0.5, 0.02),
        (0.75, 0.01),
        (0.95, 0.01),
        (0.99, 0.005),
        (0.999, 0.001),
    ] {
        assert_abs_close(
            &format!("q={q}"),
            exact_quantile(&data, q),
            d.quantile(q),
            1.0 + slope * 100.0,
        );
    }
}

#[test]
fn merging_partitions_matches_a_single_digest() {
    const N: usize = 100_000;
    // Sequential values shuffled and scaled into [0,1): every shard sees the
    // whole range in a different order.
    let data: Vec<f64> = shuffled(&gen_stream(StreamKind::Sequential, N, 0), 7)
        .into_iter()
        .map(|v| v / N as f64)
        .collect();
    let ordered = sorted(&data);

    let mut whole = digest(100.0, 8);
    whole.insert_many(data.iter().copied()).expect("insert");
    whole.compress().expect("compress");

    for parts in [2usize, 10, 50] {
        let mut merged = digest(100.0, 9);
        for (i, part) in round_robin(&data, parts).into_iter().enumerate() {
            let mut sub = digest(100.0, 100 + i as u64);
            sub.insert_many(part).expect("insert");
            merged.merge(&sub).expect("merge");
        }

        assert_eq!(merged.total_weight(), whole.total_weight());
        assert_eq!(merged.total_weight() as usize, N);

        for q in [0.001, 0.01, 0.1, 0.2, 0.3, 0.5] {
            let label = format!("parts={parts} q={q}");
            let e = merged.quantile(q) - exact_quantile(&ordered, q);
            assert!(e.abs() < 0.015, "{label}: quantile error {e}");
            if q >= 0.01 {
                assert!(e.abs() / q < 0.3, "{label}: relative quantile error {e}");
            }

            let e = merged.cdf(q) - exact_cdf(&ordered, q);
            assert!(e.abs() < 0.015, "{label}: cdf error {e}");
        }
    }
}

#[test]
fn compress_keeps_total_weight() {
    let mut d = digest(100.0, 10);
    d.insert_many(gen_stream(StreamKind::Uniform, 1_000, 10))
        .expect("insert");
    let before = d.total_weight();
    d.compress().expect("compress");
    assert_eq!(d.total_weight(), before);
    assert_eq!(
        d.centroids().map(|c| u64::from(c.weight())).sum::<u64>(),
        u64::from(before)
    );
}

#[test]
fn quantiles_never_leave_the_observed_range() {
    for (kind, seed) in [
        (StreamKind::Normal, 11),
        (StreamKind::Clumped, 12),
        (StreamKind::Permuted, 13),
    ] {
        let data = gen_stream(kind, 20_000, seed);
        let ordered = sorted(&data);
        let (lo, hi) = (ordered[0], ordered[ordered.len() - 1]);

        let mut d = digest(20.0, seed);
        d.insert_many(data).expect("insert");
        let qs: Vec<f64> = (0..=1_000).map(|i| f64::from(i) / 1_000.0).collect();
        for (q, v) in qs.iter().zip(d.quantiles(&qs)) {
            assert!(v >= lo && v <= hi, "{kind:?} q={q}: {v} outside [{lo}, {hi}]");
        }
    }
}

#[test]
fn for_each_centroid_can_stop_early() {
    let mut d = digest(10.0, 14);
    d.insert_many((0..100).map(f64::from)).expect("insert");

    let mut means = Vec::new();
    d.for_each_centroid(|m, _| {
        means.push(m);
        means.len() != 3
    });
    assert_eq!(means.len(), 3);

    let mut visited = 0;
    d.for_each_centroid(|_, _| {
        visited += 1;
        true
    });
    assert_eq!(visited, d.centroid_count());
}

#[test]
fn wire_roundtrip_through_public_api() {
    let mut d = digest(64.0, 15);
    d.insert_many(gen_stream(StreamKind::Normal, 10_000, 15))
        .expect("insert");

    let mut buf = Vec::new();
    d.encode_into(&mut buf);
    assert_eq!(buf.len(), d.encoded_len());

    let back = TDigest::from_bytes(&buf).expect("decode");
    assert_eq!(back.compression(), 64.0);
    assert_eq!(back.total_weight(), 10_000);
    assert_abs_close("median", d.quantile(0.5), back.quantile(0.5), 0.02);

    let err = TDigest::from_bytes(&buf[..5]).unwrap_err();
    assert!(matches!(err, WireError::Truncated(_)), "{err}");
}

#[test]
fn options_from_json_drive_the_builder() {
    let opts: DigestOptions =
        serde_json::from_str(r#"{"compression": 30.0, "seed": 99}"#).expect("parse options");
    let build = || {
        let mut d = TDigest::builder().options(opts).build().expect("build");
        d.insert_many(gen_stream(StreamKind::Clumped, 5_000, 1))
            .expect("insert");
        d.centroids().collect::<Vec<_>>()
    };
    assert_eq!(build(), build());

    let d = TDigest::builder().options(opts).build().expect("build");
    assert_eq!(d.compression(), 30.0);
}

#[test]
fn construction_and_query_errors_are_typed() {
    assert!(matches!(
        TDigest::new(-1.0),
        Err(TdError::InvalidCompression { .. })
    ));
    let mut d = TDigest::new(100.0).expect("digest");
    d.insert(1.0).expect("insert");
    assert_eq!(d.try_quantile(2.0), Err(TdError::InvalidQuantile { q: 2.0 }));
    assert!(matches!(d.insert(f64::INFINITY), Err(TdError::NonFiniteInput { .. })));
}
