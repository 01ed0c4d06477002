use std::{f32::consts::PI, path::PathBuf, rc::Rc};

use clap::{Parser, Subcommand};
use reactive_visualiser_core::{
    defaults_for, AnalysisSource, AudioEngine, EngineConfig, FrameScheduler, RecordingSurface,
    StyleId,
};
use tracing_subscriber::EnvFilter;

const FRAME_RATE: u32 = 60;
const KICK_INTERVAL: f32 = 0.5;
const SWEEP_SECONDS: f32 = 5.0;

fn main() -> reactive_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            config,
            style,
            width,
            height,
            frames,
            interactive,
        } => {
            let mut engine = match config {
                Some(path) => EngineConfig::load(path)?,
                None => EngineConfig::default(),
            };
            if let Some(style) = style {
                engine.style = style;
            }
            engine.width = width.unwrap_or(engine.width);
            engine.height = height.unwrap_or(engine.height);
            engine.interactive_mode |= interactive;
            run_render(&engine, frames)
        }
        Commands::Styles => {
            for style in StyleId::ALL {
                println!("{:<16} {:?}", style.name(), style.dimension());
            }
            Ok(())
        }
        Commands::Defaults { style } => {
            let style: StyleId = style.parse()?;
            println!("{}", serde_json::to_string_pretty(&defaults_for(style))?);
            Ok(())
        }
    }
}

fn run_render(config: &EngineConfig, frames: u32) -> reactive_visualiser_core::Result<()> {
    tracing::info!(style = config.style.as_str(), width = config.width, height = config.height, frames, "starting headless render");

    let audio = AudioEngine::new(config.analyser.clone())?;
    let source: Rc<dyn AnalysisSource> = Rc::new(audio.start()?);
    let mut scheduler = FrameScheduler::new();
    let style = scheduler.start(config, Some(source));

    let sample_rate = config.analyser.sample_rate.max(FRAME_RATE);
    let block_len = (sample_rate / FRAME_RATE) as usize;
    let mut signal = SyntheticSignal::new(sample_rate as f32);
    let mut surface = RecordingSurface::new(config.width as f32, config.height as f32);
    let mut commands = 0usize;

    for frame in 0..frames {
        audio.push_samples(&signal.block(block_len))?;
        let now_ms = frame as f64 * 1000.0 / FRAME_RATE as f64;
        let summary = scheduler.tick(&mut surface, now_ms);
        commands += surface.take_commands().len();

        if let Some(summary) = summary.filter(|_| (frame + 1) % FRAME_RATE == 0) {
            tracing::info!(
                second = (frame + 1) / FRAME_RATE,
                average = summary.average,
                bass = summary.bass,
                mid = summary.mid,
                treble = summary.treble,
                peak = summary.peak,
                fps = summary.fps,
                "frame summary"
            );
        }
    }

    scheduler.stop();
    tracing::info!(style = %style, frames, commands, "render finished");
    Ok(())
}

/// A bass kick every half second over a tone sweeping up the spectrum.
struct SyntheticSignal {
    sample_rate: f32,
    position: u64,
    sweep_phase: f32,
}

impl SyntheticSignal {
    fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            position: 0,
            sweep_phase: 0.0,
        }
    }

    fn block(&mut self, len: usize) -> Vec<f32> {
        (0..len).map(|_| self.next_sample()).collect()
    }

    fn next_sample(&mut self) -> f32 {
        let t = self.position as f32 / self.sample_rate;
        self.position += 1;

        let since_kick = t % KICK_INTERVAL;
        let kick = (2.0 * PI * 55.0 * since_kick).sin() * (-since_kick * 12.0).exp();

        let progress = (t % SWEEP_SECONDS) / SWEEP_SECONDS;
        let frequency = 200.0 * 20f32.powf(progress);
        self.sweep_phase = (self.sweep_phase + 2.0 * PI * frequency / self.sample_rate) % (2.0 * PI);
        let sweep = self.sweep_phase.sin() * 0.3;

        (kick * 0.7 + sweep).clamp(-1.0, 1.0)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive visualiser engine host", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive a style headlessly from a synthetic test signal.
    Render {
        /// Optional JSON engine configuration.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Style to run; overrides the configuration.
        #[arg(short, long)]
        style: Option<String>,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Number of 60 Hz frames to simulate.
        #[arg(short, long, default_value_t = 300)]
        frames: u32,
        /// Enable camera gestures for 3D styles.
        #[arg(long)]
        interactive: bool,
    },
    /// List every style with its dimension.
    Styles,
    /// Print a style's default settings as JSON.
    Defaults {
        style: String,
    },
}
