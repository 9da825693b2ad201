use langid_core::{rank, RankedLabel, ScoreKind};

fn labels(k: usize) -> Vec<String> {
    (0..k).map(|i| format!("lang{i}")).collect()
}

fn score_vectors() -> Vec<Vec<f64>> {
    vec![
        vec![0.3],
        vec![1.0, -1.0],
        vec![0.5, 0.5, 0.1, 0.9],
        vec![-3.0, 4.5, 4.5, 0.0, 2.2, -0.1],
        vec![0.05, 0.15, 0.2, 0.1, 0.3, 0.2],
    ]
}

fn is_subsequence(short: &[RankedLabel], long: &[RankedLabel]) -> bool {
    let mut rest = long.iter();
    short.iter().all(|item| rest.any(|candidate| candidate == item))
}

#[test]
fn prefixes_of_the_full_ranking() {
    for scores in score_vectors() {
        let k = scores.len();
        let names = labels(k);
        let full = rank(&scores, &names, k, ScoreKind::Margin).unwrap();
        assert_eq!(full.len(), k);
        for n in 1..=k {
            let top = rank(&scores, &names, n, ScoreKind::Margin).unwrap();
            assert_eq!(top.len(), n);
            assert!(top.windows(2).all(|pair| pair[0].score >= pair[1].score));
            assert!(is_subsequence(&top, &full));
        }
    }
}

#[test]
fn oversized_top_n_returns_every_class_once() {
    for scores in score_vectors() {
        let k = scores.len();
        let ranked = rank(&scores, &labels(k), k + 5, ScoreKind::Probability).unwrap();
        assert_eq!(ranked.len(), k);
        let mut seen: Vec<_> = ranked.iter().map(|r| r.label.clone()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), k);
    }
}
