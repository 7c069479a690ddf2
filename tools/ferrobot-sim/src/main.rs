// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ferrobot-sim - Run the competition scheduler against a scripted match
//!
//! A driver thread plays a match script on a simulated driver station while
//! the scheduler dispatches mode callbacks, printing each transition.
//!
//! ```text
//! ferrobot-sim --script disabled:1,auto:15,teleop:135,disabled:1 --speed 10
//! ```

use clap::Parser;
use colored::*;
use ferrobot::{
    Category, CompetitionHandle, CompetitionRobot, CompetitionScheduler, DriverStation,
    SchedulerConfig, SimDriverStation, DISABLED_MODE_ID,
};
use std::io::IsTerminal;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Run the competition scheduler against a scripted, simulated match
#[derive(Parser, Debug)]
#[command(name = "ferrobot-sim")]
#[command(version = "0.1.0")]
#[command(about = "Play a scripted match through the competition scheduler")]
struct Args {
    /// Match script: comma-separated mode:seconds steps ("disabled" disables)
    #[arg(
        short,
        long,
        value_delimiter = ',',
        default_value = "disabled:1,auto:15,teleop:135,disabled:1"
    )]
    script: Vec<Step>,

    /// Playback speed multiplier (10 = ten times faster than real time)
    #[arg(long, default_value = "1.0")]
    speed: f64,

    /// Interval between simulated driver station packets (ms)
    #[arg(long, default_value = "20")]
    packet_ms: u64,

    /// Mode monitor wait bound (ms), overrides FERROBOT_MONITOR_TIMEOUT_MS
    #[arg(long)]
    monitor_timeout_ms: Option<u64>,

    /// Restart the script when it ends instead of ending the competition
    #[arg(long = "loop")]
    repeat: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

/// One script step: hold `mode` for `duration`.
#[derive(Clone, Debug)]
struct Step {
    mode: String,
    duration: Duration,
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mode, secs) = s
            .split_once(':')
            .ok_or_else(|| format!("Step '{}' is not mode:seconds", s))?;
        let secs: f64 = secs
            .trim()
            .parse()
            .map_err(|_| format!("Invalid duration in step '{}'", s))?;
        let duration = Duration::try_from_secs_f64(secs)
            .map_err(|e| format!("Invalid duration in step '{}': {}", s, e))?;
        let mode = mode.trim();
        if mode.is_empty() {
            return Err(format!("Missing mode name in step '{}'", s));
        }
        Ok(Step {
            mode: mode.to_string(),
            duration,
        })
    }
}

impl Step {
    /// This step with its hold time divided by `speed`.
    fn scaled(&self, speed: f64) -> Result<Step, String> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(format!("Invalid speed: {}", speed));
        }
        let duration = Duration::try_from_secs_f64(self.duration.as_secs_f64() / speed)
            .map_err(|e| format!("Step '{}' at {}x speed: {}", self.mode, speed, e))?;
        Ok(Step {
            mode: self.mode.clone(),
            duration,
        })
    }
}

/// Robot that prints every mode entry.
struct PrintingRobot {
    driver_station: Arc<DriverStation>,
    started: Instant,
}

impl PrintingRobot {
    fn announce(&self, category: Category) {
        let label = match category {
            Category::Disabled => category.to_string().red().bold(),
            Category::Autonomous => category.to_string().cyan().bold(),
            Category::Teleop => category.to_string().green().bold(),
            Category::Test => category.to_string().yellow().bold(),
        };
        let word = self.driver_station.control_word();
        println!(
            "{} entering {:<10} {}",
            format!("[{:>8.3}s]", self.started.elapsed().as_secs_f64()).dimmed(),
            label,
            format!(
                "(mode id {}, estop={}, fms={}, ds={})",
                self.driver_station.mode_id(),
                word.is_emergency_stopped(),
                word.is_control_authority_attached(),
                word.is_operator_attached()
            )
            .dimmed()
        );
    }
}

impl CompetitionRobot for PrintingRobot {
    fn on_disabled(&mut self) {
        self.announce(Category::Disabled);
    }
    fn on_autonomous(&mut self) {
        self.announce(Category::Autonomous);
    }
    fn on_teleop(&mut self) {
        self.announce(Category::Teleop);
    }
    fn on_test(&mut self) {
        self.announce(Category::Test);
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    if let Err(e) = run_sim(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_sim(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.script.is_empty() {
        return Err("Script must contain at least one step".into());
    }
    let script = args
        .script
        .iter()
        .map(|step| step.scaled(args.speed))
        .collect::<Result<Vec<_>, _>>()?;

    let mut config = SchedulerConfig::from_env();
    if let Some(ms) = args.monitor_timeout_ms {
        config = config.with_monitor_timeout(Duration::from_millis(ms));
    }

    let sim = Arc::new(SimDriverStation::new());
    let driver_station = Arc::new(DriverStation::new(sim.clone()));
    let scheduler = CompetitionScheduler::new(Arc::clone(&driver_station), config)?;
    let handle = scheduler.handle();

    let ctrlc_handle = handle.clone();
    ctrlc::set_handler(move || {
        ctrlc_handle.end_competition();
    })?;

    println!(
        "{} {} step(s) at {}x, Ctrl+C to stop",
        "Match script:".bold(),
        args.script.len(),
        args.speed
    );

    let driver = {
        let sim = Arc::clone(&sim);
        let handle = handle.clone();
        let packet = Duration::from_millis(args.packet_ms.max(1));
        let repeat = args.repeat;
        thread::Builder::new()
            .name("ferrobot-sim-driver".to_string())
            .spawn(move || play_script(&sim, &handle, &script, packet, repeat))?
    };

    let mut robot = PrintingRobot {
        driver_station,
        started: Instant::now(),
    };
    scheduler.run(&mut robot)?;

    handle.end_competition();
    if driver.join().is_err() {
        log::warn!("[SIM] driver thread panicked");
    }

    println!(
        "{} {} report(s) from the mode monitor",
        "---".dimmed(),
        sim.reported_mode_count()
    );
    Ok(())
}

/// Play an already speed-scaled `script` on `sim`, sending a packet every
/// `packet` interval.
fn play_script(
    sim: &SimDriverStation,
    handle: &CompetitionHandle,
    script: &[Step],
    packet: Duration,
    repeat: bool,
) {
    // Mode names resolve only after the scheduler registered them.
    while handle.mode_ids().is_none() {
        if handle.is_cancelled() {
            return;
        }
        thread::sleep(packet);
    }

    sim.set_operator_attached(true);
    sim.set_control_authority_attached(true);

    loop {
        for step in script {
            if handle.is_cancelled() {
                return;
            }
            let mode_id = if step.mode == "disabled" {
                sim.disable();
                DISABLED_MODE_ID
            } else {
                sim.set_mode(&step.mode)
            };
            log::info!("[SIM] step {} (mode id {}) for {:?}", step.mode, mode_id, step.duration);

            // A hold too long for `Instant` lasts until the competition ends.
            let until = Instant::now().checked_add(step.duration);
            while until.map_or(true, |until| Instant::now() < until) {
                if handle.is_cancelled() {
                    return;
                }
                sim.notify_new_data();
                let remaining =
                    until.map_or(packet, |until| until.saturating_duration_since(Instant::now()));
                thread::sleep(packet.min(remaining));
            }
        }

        if !repeat {
            break;
        }
    }

    sim.disable();
    sim.notify_new_data();
    handle.end_competition();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_parse() {
        let step: Step = "auto:1.5".parse().expect("valid step");
        assert_eq!(step.mode, "auto");
        assert_eq!(step.duration, Duration::from_millis(1500));

        let step: Step = " teleop : 135 ".parse().expect("valid step");
        assert_eq!(step.mode, "teleop");
        assert_eq!(step.duration, Duration::from_secs(135));
    }

    #[test]
    fn test_step_rejects_malformed_input() {
        assert!("auto".parse::<Step>().is_err());
        assert!(":5".parse::<Step>().is_err());
        assert!("auto:soon".parse::<Step>().is_err());
        assert!("auto:-1".parse::<Step>().is_err());
        assert!("auto:inf".parse::<Step>().is_err());
        assert!("auto:NaN".parse::<Step>().is_err());
    }

    #[test]
    fn test_step_rejects_unrepresentable_duration() {
        let err = "auto:1e20".parse::<Step>().expect_err("too long for Duration");
        assert!(err.contains("auto:1e20"), "unexpected message: {}", err);
    }

    #[test]
    fn test_scaled_divides_duration() {
        let step: Step = "auto:15".parse().expect("valid step");
        assert_eq!(
            step.scaled(10.0).expect("scaled").duration,
            Duration::from_millis(1500)
        );
        assert_eq!(step.scaled(1.0).expect("scaled").duration, step.duration);
    }

    #[test]
    fn test_scaled_rejects_tiny_speed() {
        let step: Step = "auto:15".parse().expect("valid step");
        assert!(step.scaled(1e-300).is_err());
    }

    #[test]
    fn test_scaled_rejects_invalid_speed() {
        let step: Step = "auto:15".parse().expect("valid step");
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(step.scaled(speed).is_err(), "speed {} accepted", speed);
        }
    }
}
