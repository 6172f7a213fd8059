use playdeck::model::{RepeatMode, Track};
use playdeck::session::{PlayerSession, TrackEnd};
use std::collections::HashSet;
use std::path::PathBuf;

fn session_with(names: &[&str]) -> PlayerSession {
    let mut session = PlayerSession::new(RepeatMode::Off);
    for name in names {
        session.append_track(Track::from_path(PathBuf::from(name)));
    }
    session
}

#[test]
fn picked_files_queue_in_order_and_first_becomes_current() {
    let mut session = PlayerSession::new(RepeatMode::Off);

    assert_eq!(session.append_track(Track::from_path(PathBuf::from("a.mp3"))), 0);
    assert_eq!(session.append_track(Track::from_path(PathBuf::from("b.mp3"))), 1);
    assert_eq!(session.append_track(Track::from_path(PathBuf::from("c.mp3"))), 2);

    assert_eq!(session.len(), 3);
    assert_eq!(session.current_index(), Some(0));
    assert_eq!(session.track(1).expect("in range").display_name, "b.mp3");
}

#[test]
fn full_listening_pass_with_repeat_off_stops_at_the_end() {
    let mut session = session_with(&["a.mp3", "b.mp3", "c.mp3"]);

    assert_eq!(session.track_ended(), TrackEnd::Advance(1));
    assert_eq!(session.track_ended(), TrackEnd::Advance(2));
    assert_eq!(session.track_ended(), TrackEnd::Stop);
    assert_eq!(session.current_index(), Some(2));
}

#[test]
fn repeat_all_cycles_through_the_catalog_forever() {
    let mut session = session_with(&["a.mp3", "b.mp3", "c.mp3"]);
    session.toggle_repeat();
    session.toggle_repeat();

    let mut visited = Vec::new();
    for _ in 0..6 {
        match session.track_ended() {
            TrackEnd::Advance(index) => visited.push(index),
            other => panic!("repeat all must always advance, got {other:?}"),
        }
    }
    assert_eq!(visited, vec![1, 2, 0, 1, 2, 0]);
}

#[test]
fn repeat_one_track_ended_scenario() {
    let mut session = session_with(&["a.mp3", "b.mp3"]);
    session.toggle_repeat();

    assert_eq!(session.track_ended(), TrackEnd::Restart);
    assert_eq!(session.current_index(), Some(0));
}

#[test]
fn shuffled_pass_visits_every_track_once_then_stops() {
    let mut session = session_with(&["a.mp3", "b.mp3", "c.mp3", "d.mp3"]);
    session.toggle_shuffle();

    let order = session.shuffle_order().to_vec();
    session.set_current(order[0]).expect("in range");

    let mut visited = vec![order[0]];
    loop {
        match session.track_ended() {
            TrackEnd::Advance(index) => visited.push(index),
            TrackEnd::Stop => break,
            TrackEnd::Restart => panic!("repeat is off"),
        }
    }

    assert_eq!(visited, order, "off-mode pass follows the permutation");
    let distinct: HashSet<usize> = visited.iter().copied().collect();
    assert_eq!(distinct.len(), 4);
}

#[test]
fn manual_skips_wrap_while_auto_advance_does_not() {
    let mut session = session_with(&["a.mp3", "b.mp3"]);
    session.set_current(1).expect("in range");

    assert_eq!(session.track_ended(), TrackEnd::Stop);
    assert_eq!(session.advance_next(), Some(0), "manual next wraps regardless");
}

#[test]
fn toggling_shuffle_mid_session_preserves_current_track() {
    let mut session = session_with(&["a.mp3", "b.mp3", "c.mp3"]);
    session.set_current(1).expect("in range");

    session.toggle_shuffle();
    assert_eq!(session.current_index(), Some(1));

    session.toggle_shuffle();
    assert_eq!(session.current_index(), Some(1));
    assert!(session.shuffle_order().is_empty());
}
