//! # Beacon Example
//!
//! Keys a short beacon ("VVV DE SOS") on a console "relay" at 20 wpm, with the
//! built-in `LogWriter` subscriber reporting every playback event.
//!
//! The text is translated to timing units here; the scheduler only knows dots,
//! dashes and pauses.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example beacon --features logging
//! ```

use std::{sync::Arc, time::Duration};

use morsekey::{
    Config, Level, ListenerFn, ListenerRef, LogWriter, Scheduler, SinkError, StopMode, Subscribe,
    Timing, TimingUnit,
};
use tokio::time::Instant;

fn letter(c: char) -> &'static str {
    match c {
        'D' => "-..",
        'E' => ".",
        'O' => "---",
        'S' => "...",
        'V' => "...-",
        _ => "",
    }
}

/// Text to timing units: letters separated by char pauses, words by word pauses.
fn encode(text: &str) -> Vec<TimingUnit> {
    let mut units = Vec::new();
    for (w, word) in text.split_whitespace().enumerate() {
        if w > 0 {
            units.push(TimingUnit::WordBoundaryPause);
        }
        for (i, c) in word.chars().enumerate() {
            if i > 0 {
                units.push(TimingUnit::CharBoundaryPause);
            }
            units.extend(letter(c).chars().map(|s| match s {
                '.' => TimingUnit::Dot,
                _ => TimingUnit::Dash,
            }));
        }
    }
    units
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut cfg = Config::default();
    cfg.timing = Timing::from_wpm(20);
    cfg.grace = Duration::from_secs(10);

    let origin = Instant::now();
    let relay = Arc::new(move |level: Level| -> Result<(), SinkError> {
        println!("{:>6} ms  relay {level}", origin.elapsed().as_millis());
        Ok(())
    });

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
    let sched = Scheduler::builder(cfg).with_subscribers(subs).build(relay);
    sched.start()?;

    let units = encode("VVV DE SOS");
    println!("beacon: {} units, {:?} on air", units.len(), {
        let timing = sched.timing();
        units.iter().map(|u| timing.duration_of(*u)).sum::<Duration>()
    });

    let done: ListenerRef = ListenerFn::arc("beacon-done", || async { println!("beacon sent") });
    sched.submit_sequence(units, Some(done));

    sched.wait_idle().await;
    sched.stop(StopMode::Drain).await?;
    Ok(())
}
