//! LED matrix CLI - Convert media to frame files and preview them.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use ledmatrix::{
    animation::{AnsiPresenter, Command, CommandSender, Player, Step, load_sequence},
    compute::write_sample_palette,
    convert::convert_path,
    schema::ToolConfig,
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "--example" => print_example_config(),
        "convert" if args.len() >= 4 => {
            let config = load_config(args.get(4));
            run_convert(Path::new(&args[2]), Path::new(&args[3]), &config);
        }
        "play" if args.len() >= 3 => {
            let config = load_config(args.get(3));
            run_play(&args[2], &config);
        }
        "sample" if args.len() >= 3 => {
            if let Err(e) = write_sample_palette(Path::new(&args[2])) {
                eprintln!("Error writing sample image: {}", e);
                std::process::exit(1);
            }
            println!("Wrote {}", args[2]);
        }
        _ => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {} convert <input> <output_dir> [config.json]", program);
    eprintln!("  {} play <pattern> [config.json]", program);
    eprintln!("  {} sample <output.png>", program);
    eprintln!("  {} --example", program);
    eprintln!();
    eprintln!("Convert images, GIFs and videos into LED matrix frame files,");
    eprintln!("or preview a frame sequence in the terminal.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  input        Image, GIF or video file");
    eprintln!("  output_dir   Directory for the generated .json frames");
    eprintln!("  pattern      Glob matching frame files, e.g. 'out/clip_frame_*.json'");
    eprintln!("  config.json  Tool configuration (default: built-in)");
    eprintln!();
    eprintln!("Example configuration is generated with --example flag.");
}

fn load_config(path: Option<&String>) -> ToolConfig {
    let Some(path) = path.map(PathBuf::from) else {
        return ToolConfig::default();
    };

    let config_str = fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: ToolConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    config
}

fn run_convert(input: &Path, out_dir: &Path, config: &ToolConfig) {
    let convert = &config.convert;

    println!("LED Matrix Conversion");
    println!("=====================");
    println!("Input: {}", input.display());
    println!("Matrix: {}x{}", convert.width, convert.height);
    println!(
        "Adjust: brightness={} contrast={} saturation={}",
        convert.adjust.brightness, convert.adjust.contrast, convert.adjust.saturation
    );
    println!();

    let start = Instant::now();
    let report = convert_path(input, out_dir, convert).unwrap_or_else(|e| {
        eprintln!("Error converting {}: {}", input.display(), e);
        std::process::exit(1);
    });

    println!("Wrote {} to {}", report.stats, out_dir.display());
    if report.skipped > 0 {
        println!(
            "Skipped {} of {} selected frames (decode errors)",
            report.skipped, report.requested
        );
    }
    println!("Time: {:.2}s", start.elapsed().as_secs_f32());
}

fn run_play(pattern: &str, config: &ToolConfig) {
    let sequence = load_sequence(pattern).unwrap_or_else(|e| {
        eprintln!("Error loading frames: {}", e);
        std::process::exit(1);
    });

    if sequence.is_empty() {
        eprintln!("No frames match {}", pattern);
        std::process::exit(1);
    }

    let mut player = Player::spawn(AnsiPresenter::stdout(), &config.playback).unwrap_or_else(|e| {
        eprintln!("Error starting playback: {}", e);
        std::process::exit(1);
    });

    // Clear screen; the presenter redraws from the top-left corner.
    print!("\x1b[2J");
    player.load(&sequence);
    if config.playback.autoplay {
        player.send(Command::TogglePlay);
    }

    eprintln!("Keys (then Enter): p play/pause, n next, b back, q quit");
    spawn_input_reader(player.command_sender());

    if let Err(e) = player.wait() {
        eprintln!("Playback error: {}", e);
        std::process::exit(1);
    }
}

/// Map stdin lines to playback commands until `q` or end of input.
fn spawn_input_reader(commands: CommandSender) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "" | "p" => Command::TogglePlay,
                "n" => Command::Seek(Step::Forward),
                "b" => Command::Seek(Step::Back),
                "q" => Command::Stop,
                other => {
                    log::warn!("Unknown key {:?}", other);
                    continue;
                }
            };
            if !commands.send(command) || command == Command::Stop {
                return;
            }
        }
        commands.send(Command::Stop);
    });
}

fn print_example_config() {
    let config = ToolConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
