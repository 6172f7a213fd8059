#![no_main]

use libfuzzer_sys::fuzz_target;
use playdeck::model::{RepeatMode, Track};
use playdeck::session::PlayerSession;
use std::path::PathBuf;

fuzz_target!(|data: &[u8]| {
    let mut session = PlayerSession::new(RepeatMode::Off);
    let len = (data.len() % 32).max(1);
    for idx in 0..len {
        session.append_track(Track::from_path(PathBuf::from(format!("track_{idx}.mp3"))));
    }

    for byte in data {
        match byte % 7 {
            0 => {
                let _ = session.advance_next();
            }
            1 => {
                let _ = session.advance_previous();
            }
            2 => session.toggle_shuffle(),
            3 => session.toggle_repeat(),
            4 => {
                let _ = session.track_ended();
            }
            5 => {
                let _ = session.set_current(usize::from(*byte) % (session.len() + 1));
            }
            _ => {
                session.append_track(Track::from_path(PathBuf::from("extra.mp3")));
            }
        }

        if let Some(idx) = session.current_index() {
            assert!(idx < session.len());
        }
        if session.shuffle_enabled() {
            assert_eq!(session.shuffle_order().len(), session.len());
        }
    }
});
