use super::*;

fn utt(speaker: &str, start: u64, end: u64, text: &str) -> Utterance {
    Utterance::new(SpeakerId::new(speaker), start, end, text).unwrap()
}

fn sample() -> UtteranceStore {
    UtteranceStore::new(vec![
        utt("A", 0, 1000, "Hello there"),
        utt("B", 500, 1500, "General Kenobi"),
        utt("A", 2000, 3000, "You are a bold one"),
    ])
}

#[test]
fn edit_text_replaces_text_only() {
    let mut s = sample();
    s.edit_text(1, "edited").unwrap();
    let u = s.get(1).unwrap();
    assert_eq!(u.text(), "edited");
    assert_eq!((u.start_ms(), u.end_ms()), (500, 1500));
    assert_eq!(u.speaker().as_str(), "B");
}

#[test]
fn edit_text_out_of_range_fails() {
    let mut s = sample();
    let err = s.edit_text(3, "nope").unwrap_err();
    assert!(matches!(
        err,
        CaptionError::IndexOutOfRange { index: 3, len: 3 }
    ));
    assert_eq!(s, sample());
}

#[test]
fn filter_keeps_arrival_indices() {
    let s = sample();
    let idx: Vec<usize> = s
        .filter(|u| u.speaker().as_str() == "A")
        .map(|(i, _)| i)
        .collect();
    assert_eq!(idx, vec![0, 2]);
}

#[test]
fn utterance_filter_combines_speaker_and_query() {
    let s = sample();
    let f = UtteranceFilter {
        speaker: Some(SpeakerId::new("A")),
        query: Some("BOLD".to_owned()),
    };
    let hits: Vec<usize> = s.filter(|u| f.matches(u)).map(|(i, _)| i).collect();
    assert_eq!(hits, vec![2]);

    let blank = UtteranceFilter {
        speaker: None,
        query: Some("   ".to_owned()),
    };
    assert_eq!(s.filter(|u| blank.matches(u)).count(), 3);
}

#[test]
fn speakers_are_first_seen_order() {
    let s = sample();
    let names: Vec<String> = s.speakers().into_iter().map(|s| s.0).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(s.end_ms(), 3000);
    assert_eq!(UtteranceStore::default().end_ms(), 0);
}
