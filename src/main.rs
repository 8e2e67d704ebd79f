//! Voice Chase headless driver
//!
//! Runs chase sessions against a procedural voice and prints the results.
//! With `--realtime` the voice is produced on a capture thread and handed
//! over through the frame queue, the way a microphone callback would be.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;

use voice_chase::audio::{AudioSource, SampleFormat, SynthSource, VoiceScript, frame_channel};
use voice_chase::consts::TICK_HZ;
use voice_chase::hud::meter_cells;
use voice_chase::sim::TickResult;
use voice_chase::{ChaseConfig, ChaseSession, Preset, Scoreboard};

/// Frames the capture thread may run ahead of the simulation
const QUEUE_CAPACITY: usize = 8;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Args {
    /// Built-in configuration (dog-run, car-chases-dog, dog-chases-car, pixel-dog-chases-car)
    #[arg(long, default_value = "dog-run")]
    preset: String,

    /// JSON config file; overrides --preset
    #[arg(long)]
    config: Option<PathBuf>,

    /// Voice script (silence, steady, shout, bursts)
    #[arg(long, default_value = "steady")]
    script: String,

    /// Seed for the synthetic noise floor
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Sessions to play; each round reseeds the voice
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// Tick rate in realtime mode
    #[arg(long, default_value_t = TICK_HZ)]
    tick_hz: u32,

    /// Pace ticks with the wall clock and capture on a separate thread
    #[arg(long, default_value_t = false)]
    realtime: bool,

    /// Send 16-bit PCM frames instead of float frames
    #[arg(long, default_value_t = false)]
    pcm16: bool,

    /// Print one JSON snapshot per tick
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Give up on a session after this many ticks (endurance runs never finish)
    #[arg(long, default_value_t = 20_000)]
    max_ticks: u64,
}

fn load_config(args: &Args) -> Result<ChaseConfig> {
    match &args.config {
        Some(path) => ChaseConfig::load(path).with_context(|| format!("loading config {}", path.display())),
        None => {
            let preset = Preset::from_str(&args.preset).with_context(|| format!("unknown preset '{}'", args.preset))?;
            Ok(ChaseConfig::from_preset(preset))
        }
    }
}

fn voice(args: &Args, round: u32) -> Result<SynthSource> {
    let Some(script) = VoiceScript::from_str(&args.script) else {
        bail!("unknown voice script '{}'", args.script);
    };
    let format = if args.pcm16 {
        SampleFormat::Pcm16
    } else {
        SampleFormat::Float32
    };
    Ok(SynthSource::new(script, args.seed.wrapping_add(round as u64)).with_format(format))
}

fn report(session: &ChaseSession, args: &Args) -> Result<()> {
    let snap = session.snapshot();
    if args.json {
        println!("{}", serde_json::to_string(&snap)?);
    } else if snap.tick % u64::from(args.tick_hz.max(1)) == 0 {
        let level = snap.last_loudness.map_or(0.0, |s| s.level);
        let positions: Vec<String> = snap
            .agents
            .iter()
            .map(|a| format!("{}={:.2}", a.role, a.position))
            .collect();
        println!(
            "tick {:>6}  [{:<10}]  {}  gap {:.2}  score {:.1}",
            snap.tick,
            "#".repeat(meter_cells(level, 10)),
            positions.join(" "),
            snap.hud.gap,
            snap.score
        );
    }
    Ok(())
}

/// Run one session to completion (or `max_ticks`) pulling from `source`
fn run_session<S: AudioSource + ?Sized>(
    session: &mut ChaseSession,
    source: &mut S,
    args: &Args,
    pace: Option<Duration>,
) -> Result<()> {
    let mut next = Instant::now();
    while session.state().tick < args.max_ticks {
        let result = session.step(source);
        report(session, args)?;
        if matches!(result, TickResult::Finished(_) | TickResult::Frozen(_)) {
            break;
        }
        if let Some(period) = pace {
            next += period;
            if let Some(wait) = next.checked_duration_since(Instant::now()) {
                thread::sleep(wait);
            }
        }
    }
    Ok(())
}

fn play_round(session: &mut ChaseSession, args: &Args, round: u32) -> Result<()> {
    let mut synth = voice(args, round)?;

    if !args.realtime {
        return run_session(session, &mut synth, args, None);
    }

    let period = Duration::from_secs_f64(1.0 / f64::from(args.tick_hz.max(1)));
    let (mut tx, mut rx) = frame_channel(QUEUE_CAPACITY);
    let stop = Arc::new(AtomicBool::new(false));

    let capture = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut next = Instant::now();
            while !stop.load(Ordering::Relaxed) {
                tx.push(synth.next_frame());
                next += period;
                if let Some(wait) = next.checked_duration_since(Instant::now()) {
                    thread::sleep(wait);
                }
            }
            tx.dropped()
        })
    };

    let result = run_session(session, &mut rx, args, Some(period));
    stop.store(true, Ordering::Relaxed);
    match capture.join() {
        Ok(dropped) if dropped > 0 => log::info!("Capture thread dropped {} frame(s)", dropped),
        Ok(_) => {}
        Err(_) => log::error!("Capture thread panicked"),
    }
    result
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = load_config(&args)?;
    log::info!("Voice Chase starting ({} round(s), script {})", args.rounds, args.script);

    let mut session = ChaseSession::new(config).context("invalid chase config")?;
    let mut board = Scoreboard::new();

    for round in 0..args.rounds {
        if round > 0 {
            session.reset();
        }
        play_round(&mut session, &args, round)?;

        let Some(summary) = session.summary() else {
            println!(
                "Round {}: no outcome after {} ticks (score {:.1})",
                round + 1,
                session.state().tick,
                session.state().score
            );
            continue;
        };

        println!(
            "Round {}: {} at tick {} - {:?}, score {:.1} - {}",
            round + 1,
            summary.outcome.as_str(),
            summary.ticks,
            summary.verdict,
            summary.score,
            summary.rating.as_str()
        );
        if let Some(rank) = board.record(summary) {
            log::info!("Round {} placed #{} on the scoreboard", round + 1, rank);
        }
    }

    if let Some(best) = board.top_score() {
        println!("Best score: {:.1} ({} victory/ies)", best, board.victories());
    }

    Ok(())
}
