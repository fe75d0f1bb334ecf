use recite_core::model::ExtractionProgress;
use recite_core::playback::{Outcome, PlaybackState};

/// Extracted text goes to stdout untouched.
pub fn print(text: &str) {
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
}

/// Progress lines go to stderr so stdout stays pipeable.
pub fn progress(p: &ExtractionProgress) {
    eprintln!("{}", p.display());
}

pub fn state(state: PlaybackState) {
    eprintln!("[{state}]");
}

pub fn outcome(outcome: Outcome) {
    match outcome {
        Outcome::Started(id) => eprintln!("  started utterance {id}"),
        Outcome::Resumed => eprintln!("  resumed"),
        Outcome::Paused => eprintln!("  paused"),
        Outcome::Boundary(at) => eprintln!("  at character {at}"),
        Outcome::Finished(id) => eprintln!("  finished utterance {id}"),
        Outcome::Ignored => eprintln!("  (nothing to do)"),
    }
}
