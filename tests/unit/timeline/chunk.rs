use super::*;
use crate::transcript::utterance::SpeakerId;

fn utt(start: u64, end: u64, text: &str) -> Utterance {
    Utterance::new(SpeakerId::new("A"), start, end, text).unwrap()
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn eight_words_make_two_even_chunks() {
    let u = utt(0, 2000, "a b c d e f g h");
    let w = chunk_windows(&u);
    assert_eq!(w.len(), 2);
    assert_eq!((w[0].start_ms, w[0].end_ms), (0.0, 1000.0));
    assert_eq!((w[1].start_ms, w[1].end_ms), (1000.0, 2000.0));

    assert_eq!(active_chunk(&u, 500.0).unwrap().text, "a b c d");
    assert_eq!(active_chunk(&u, 1500.0).unwrap().text, "e f g h");
}

#[test]
fn envelope_near_chunk_end() {
    let u = utt(0, 2000, "a b c d e f g h");
    let c = active_chunk(&u, 950.0).unwrap();
    assert_eq!(c.text, "a b c d");
    assert!(approx(c.opacity, 0.5), "{}", c.opacity);
    assert!(approx(c.scale, 0.99), "{}", c.scale);
    assert_eq!(c.translate_y, 0.0);
}

#[test]
fn partition_is_complete_and_gapless() {
    for n in 1..=13usize {
        let text = (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let u = utt(1000, 4333, &text);
        let w = chunk_windows(&u);
        assert_eq!(w.len(), n.div_ceil(WORDS_PER_CHUNK), "n={n}");
        assert_eq!(w.iter().map(|c| c.word_count).sum::<usize>(), n);
        assert!(w.iter().all(|c| (1..=WORDS_PER_CHUNK).contains(&c.word_count)));
        assert_eq!(w.first().unwrap().start_ms, 1000.0);
        assert_eq!(w.last().unwrap().end_ms, 4333.0);
        for pair in w.windows(2) {
            assert_eq!(pair[0].end_ms, pair[1].start_ms);
            assert_eq!(pair[0].first_word + pair[0].word_count, pair[1].first_word);
        }
    }
}

#[test]
fn last_group_may_be_short() {
    let u = utt(0, 600, "one two three four five six");
    let w = chunk_windows(&u);
    assert_eq!(w.len(), 2);
    assert_eq!(w[1].word_count, 2);
    assert_eq!((w[1].start_ms, w[1].end_ms), (400.0, 600.0));
    assert_eq!(active_chunk(&u, 600.0).unwrap().text, "five six");
}

#[test]
fn whitespace_runs_do_not_create_words() {
    let u = utt(0, 400, "  a \t b\n\nc   d ");
    let w = chunk_windows(&u);
    assert_eq!(w.len(), 1);
    assert_eq!(active_chunk(&u, 200.0).unwrap().text, "a b c d");
}

#[test]
fn outside_or_empty_yields_nothing() {
    let u = utt(100, 200, "a b");
    assert!(active_chunk(&u, 99.0).is_none());
    assert!(active_chunk(&u, 201.0).is_none());
    let empty = utt(0, 100, "   ");
    assert!(chunk_windows(&empty).is_empty());
    assert!(active_chunk(&empty, 50.0).is_none());
}

#[test]
fn boundary_instant_belongs_to_the_later_group() {
    let u = utt(0, 2000, "a b c d e f g h");
    let c = active_chunk(&u, 1000.0).unwrap();
    assert_eq!(c.text, "e f g h");
    assert_eq!(c.opacity, 0.0);
    assert!(approx(c.scale, 0.8));
    assert!(approx(c.translate_y, 20.0));
}

#[test]
fn segmentation_is_deterministic() {
    let u = utt(0, 3000, "the quick brown fox jumps over the lazy dog");
    for t in [0.0, 12.5, 1333.0, 2999.9, 3000.0] {
        assert_eq!(active_chunk(&u, t), active_chunk(&u, t));
    }
    assert_eq!(chunk_windows(&u), chunk_windows(&u));
}

#[test]
fn envelope_shape() {
    let mut prev = envelope(0.0).opacity;
    for i in 1..=100 {
        let p = f64::from(i) * 0.001;
        let o = envelope(p).opacity;
        assert!(o >= prev, "fade-in must not decrease at {p}");
        prev = o;
    }
    for i in 101..900 {
        let p = f64::from(i) * 0.001;
        assert_eq!(envelope(p).opacity, 1.0, "plateau at {p}");
    }
    let mut prev = envelope(0.9).opacity;
    for i in 901..=1000 {
        let p = f64::from(i) * 0.001;
        let o = envelope(p).opacity;
        assert!(o <= prev, "fade-out must not increase at {p}");
        prev = o;
    }
    assert_eq!(envelope(0.5).opacity, 1.0);
    assert_eq!(envelope(0.5).scale, 1.0);
    assert_eq!(envelope(0.5).translate_y, 0.0);
    assert_eq!(envelope(1.0).opacity, 0.0);
}
