//! voxdeck main entry point
//!
//! The interactive panel wraps a playback controller around a speech engine
//! and drives it from single keypresses: space plays or stops, +/- moves the
//! volume, m toggles mute, v cycles voices. The loop polls stdin with a
//! timeout derived from the controller's next deadline so progress ticks and
//! status expiry fire on time.

use log::{debug, error, info};
use mio::{Events, Interest, Poll, Token};
use nix::sys::termios::Termios;
use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::process;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use voxdeck::config::Config;
use voxdeck::controller::{PlaybackController, PlaybackState};
#[cfg(feature = "native")]
use voxdeck::engine::backends::NativeEngine;
use voxdeck::engine::backends::MockEngine;
use voxdeck::engine::{SpeechEngine, VoiceDescriptor};
use voxdeck::tty::{restore_termios, set_raw_mode};

/// Token for stdin in mio poll
const STDIN: Token = Token(0);

/// Volume step for the +/- keys
const VOLUME_STEP: u8 = 5;
/// Rate and pitch step for their nudge keys
const SETTING_STEP: f32 = 0.1;

/// How long a mock utterance plays before finishing on its own
const MOCK_UTTERANCE_LENGTH: Duration = Duration::from_secs(2);

struct Options {
    debug: bool,
    mock: bool,
    list_voices: bool,
    json: bool,
    text: Option<String>,
}

fn parse_args() -> Result<Options> {
    let mut options = Options {
        debug: false,
        mock: false,
        list_voices: false,
        json: false,
        text: None,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--debug" | "-d" => options.debug = true,
            "--mock" => options.mock = true,
            "--list-voices" => options.list_voices = true,
            "--json" => options.json = true,
            "--text" => {
                options.text = Some(args.next().context("--text requires a value")?);
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other => bail!("unknown argument: {} (try --help)", other),
        }
    }

    Ok(options)
}

fn print_usage() {
    println!("Usage: voxdeck [OPTIONS]");
    println!();
    println!("  -d, --debug        log debug output to voxdeck.log");
    println!("      --mock         use the in-memory engine instead of platform TTS");
    println!("      --list-voices  print the available voices and exit");
    println!("      --json         with --list-voices, print JSON");
    println!("      --text TEXT    start with TEXT instead of the saved text");
}

fn main() {
    let options = match parse_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    // Initialize logger
    if options.debug {
        // Debug mode: write to voxdeck.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("voxdeck.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open voxdeck.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "voxdeck version {} starting (debug mode, logging to voxdeck.log)",
            voxdeck::VERSION
        );
    } else {
        // Normal mode: minimal logging to stderr, only errors
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    // Run the application
    if let Err(e) = run(options) {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn create_engine(options: &Options) -> Result<Box<dyn SpeechEngine>> {
    if options.mock {
        info!("Using in-memory mock engine");
        let engine = MockEngine::with_voices(vec![
            VoiceDescriptor::new("mock-en-us", "Morgan", "en-US"),
            VoiceDescriptor::new("mock-en-gb", "Tessa", "en-GB"),
        ])
        .auto_complete_after(MOCK_UTTERANCE_LENGTH);
        return Ok(Box::new(engine));
    }

    #[cfg(feature = "native")]
    let engine: Result<Box<dyn SpeechEngine>> = NativeEngine::new()
        .map(|e| Box::new(e) as Box<dyn SpeechEngine>)
        .context("failed to initialize the speech engine");
    #[cfg(not(feature = "native"))]
    let engine: Result<Box<dyn SpeechEngine>> =
        Err(anyhow::anyhow!("built without the native backend; run with --mock"));

    engine
}

fn run(options: Options) -> Result<()> {
    debug!("Initializing voxdeck");

    let engine = create_engine(&options)?;

    if options.list_voices {
        return list_voices(engine, options.json);
    }

    // Load configuration; the saved speech parameters seed the panel
    let mut config = Config::load().context("failed to load configuration")?;
    info!("Configuration loaded from {:?}", config.path());

    let mut request = config.initial_request();
    if let Some(text) = &options.text {
        request.text = text.clone();
    }

    let mut controller = PlaybackController::new(engine);
    controller.set_request(request);

    println!("{} {} ready", voxdeck::APP_NAME, voxdeck::VERSION);
    println!("Configuration loaded: {}", config.path().display());
    println!("Voices available: {}", controller.voices().len());
    print_help();

    // Raw mode lets the panel react to single keypresses without echo.
    // Failure means stdin is not a terminal.
    let stdin = io::stdin();
    let original_termios = match set_raw_mode(&stdin) {
        Ok(termios) => termios,
        Err(e) => {
            eprintln!("Error: voxdeck requires an interactive terminal ({})", e);
            eprintln!("Usage: run voxdeck directly in a terminal, not through pipes or redirects");
            process::exit(1);
        }
    };

    // Ensure we restore terminal on exit
    let _guard = TermiosGuard {
        termios: original_termios,
    };

    // Set up event loop; we monitor stdin for key input
    let stdin_fd = stdin.as_raw_fd();
    let mut poll = Poll::new()?;
    let mut stdin_source = mio::unix::SourceFd(&stdin_fd);
    poll.registry()
        .register(&mut stdin_source, STDIN, Interest::READABLE)?;
    let mut events = Events::with_capacity(16);

    info!("voxdeck ready - entering event loop");

    let mut panel = Panel::new();

    // Main event loop: drain engine events, run due timers, redraw, then
    // wait for input no longer than the next controller deadline.
    loop {
        controller.pump();
        controller.run_due(Instant::now());
        panel.render(&controller)?;

        let timeout = controller
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .map(|delay| delay.min(Duration::from_millis(100)))
            .or(Some(Duration::from_millis(100)));

        poll.poll(&mut events, timeout)?;

        for event in events.iter() {
            if event.token() == STDIN {
                let mut buf = [0u8; 64];
                let n = io::stdin().read(&mut buf)?;
                if n == 0 {
                    continue;
                }
                match panel.handle_input(&buf[..n], &mut controller, &mut config)? {
                    PanelAction::Continue => {}
                    PanelAction::Quit => {
                        print!("\r\n");
                        io::stdout().flush()?;
                        info!("Quit requested");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Print the available voices, optionally as JSON
fn list_voices(mut engine: Box<dyn SpeechEngine>, json: bool) -> Result<()> {
    let voices = engine.voices().context("failed to enumerate voices")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&voices)?);
    } else if voices.is_empty() {
        println!("no voices reported by the engine");
    } else {
        for (index, voice) in voices.iter().enumerate() {
            println!("{}: {}", index, voice.label());
        }
    }

    Ok(())
}

fn print_help() {
    print!("  space play/stop   r reset    m mute       +/- volume\r\n");
    print!("  [/] rate          {{/}} pitch  d defaults   v next voice\r\n");
    print!("  V list voices     t text     w save       q quit\r\n");
}

/// Which input mode the panel is in
enum PanelMode {
    /// Single-key commands
    Keys,
    /// Collecting replacement text until Enter; Esc cancels
    TextEntry(String),
}

enum PanelAction {
    Continue,
    Quit,
}

/// Single-line status panel over the controller
struct Panel {
    mode: PanelMode,
    /// Width of the last rendered line, for clean redraws
    last_width: usize,
}

impl Panel {
    fn new() -> Self {
        Self {
            mode: PanelMode::Keys,
            last_width: 0,
        }
    }

    /// Redraw the status line in place.
    fn render<E: SpeechEngine>(&mut self, controller: &PlaybackController<E>) -> Result<()> {
        let line = match &self.mode {
            PanelMode::TextEntry(buffer) => format!("text> {}", buffer),
            PanelMode::Keys => {
                let request = controller.request();
                let state = match controller.state() {
                    PlaybackState::Speaking => "speaking",
                    PlaybackState::Stopped => "stopping",
                    PlaybackState::Idle => "idle",
                };
                let volume = if request.muted {
                    "muted  ".to_string()
                } else {
                    format!("vol {:3}", request.volume)
                };
                let voice = match request.voice.and_then(|i| controller.voices().get(i)) {
                    Some(v) => v.label(),
                    None => "default voice".to_string(),
                };
                let status = controller.status().map(|s| s.text()).unwrap_or("");
                format!(
                    "[{:8}] {} {:3}%  {}  rate {:.1}  pitch {:.1}  {}  {}",
                    state,
                    progress_bar(controller.progress()),
                    controller.progress(),
                    volume,
                    request.rate,
                    request.pitch,
                    voice,
                    status
                )
            }
        };

        let width = line.chars().count();
        let padding = self.last_width.saturating_sub(width);
        self.last_width = width;

        let mut stdout = io::stdout();
        write!(stdout, "\r{}{}", line, " ".repeat(padding))?;
        stdout.flush()?;
        Ok(())
    }

    fn handle_input<E: SpeechEngine>(
        &mut self,
        input: &[u8],
        controller: &mut PlaybackController<E>,
        config: &mut Config,
    ) -> Result<PanelAction> {
        // Escape sequences (arrows, function keys) arrive as one chunk and
        // are not bound to anything.
        if matches!(self.mode, PanelMode::Keys) && input.len() > 1 && input[0] == 0x1b {
            return Ok(PanelAction::Continue);
        }

        let text = String::from_utf8_lossy(input);
        for ch in text.chars() {
            if let PanelAction::Quit = self.handle_key(ch, controller, config)? {
                return Ok(PanelAction::Quit);
            }
        }
        Ok(PanelAction::Continue)
    }

    fn handle_key<E: SpeechEngine>(
        &mut self,
        key: char,
        controller: &mut PlaybackController<E>,
        config: &mut Config,
    ) -> Result<PanelAction> {
        if let PanelMode::TextEntry(buffer) = &mut self.mode {
            match key {
                '\r' | '\n' => {
                    controller.set_text(buffer.clone());
                    self.mode = PanelMode::Keys;
                }
                '\x1b' => {
                    self.mode = PanelMode::Keys;
                }
                '\x08' | '\x7f' => {
                    buffer.pop();
                }
                ch if !ch.is_control() => buffer.push(ch),
                _ => {}
            }
            return Ok(PanelAction::Continue);
        }

        match key {
            ' ' => {
                if controller.state() == PlaybackState::Speaking {
                    controller.stop();
                } else {
                    let request = controller.request().clone();
                    controller.play(request);
                }
            }
            'r' => controller.reset(),
            'm' => {
                let muted = !controller.request().muted;
                controller.set_muted(muted);
            }
            '+' | '=' => {
                let volume = controller.request().volume.saturating_add(VOLUME_STEP);
                controller.set_volume(volume.min(100));
            }
            '-' | '_' => {
                let volume = controller.request().volume.saturating_sub(VOLUME_STEP);
                controller.set_volume(volume);
            }
            ']' => {
                let rate = controller.request().rate + SETTING_STEP;
                controller.set_rate(rate);
            }
            '[' => {
                let rate = controller.request().rate - SETTING_STEP;
                controller.set_rate(rate);
            }
            '}' => {
                let pitch = controller.request().pitch + SETTING_STEP;
                controller.set_pitch(pitch);
            }
            '{' => {
                let pitch = controller.request().pitch - SETTING_STEP;
                controller.set_pitch(pitch);
            }
            'd' => {
                controller.set_rate(1.0);
                controller.set_pitch(1.0);
            }
            'v' => {
                let next = next_voice(controller.request().voice, controller.voices().len());
                controller.set_voice(next);
            }
            'V' => {
                print!("\r\n");
                if controller.voices().is_empty() {
                    print!("no voices reported by the engine\r\n");
                }
                for (index, voice) in controller.voices().iter().enumerate() {
                    print!("  {}: {}\r\n", index, voice.label());
                }
                self.last_width = 0;
            }
            't' => {
                self.mode = PanelMode::TextEntry(controller.request().text.clone());
            }
            'w' => {
                config.remember_request(controller.request());
                config.save()?;
                print!("\r\nsettings saved to {}\r\n", config.path().display());
                self.last_width = 0;
            }
            '?' | 'h' => {
                print!("\r\n");
                print_help();
                self.last_width = 0;
            }
            'q' | '\x03' | '\x04' => return Ok(PanelAction::Quit),
            _ => {}
        }

        Ok(PanelAction::Continue)
    }
}

/// Ten-cell progress bar for the status line
fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress / 10);
    let mut bar = String::with_capacity(12);
    bar.push('[');
    for cell in 0..10 {
        bar.push(if cell < filled { '#' } else { '-' });
    }
    bar.push(']');
    bar
}

/// Cycle default -> 0 -> 1 -> ... -> default
fn next_voice(current: Option<usize>, count: usize) -> Option<usize> {
    match current {
        None if count > 0 => Some(0),
        None => None,
        Some(index) if index + 1 < count => Some(index + 1),
        Some(_) => None,
    }
}

/// RAII guard to restore terminal attributes on exit
struct TermiosGuard {
    termios: Termios,
}

impl Drop for TermiosGuard {
    fn drop(&mut self) {
        restore_termios(io::stdin(), &self.termios);
        debug!("Terminal attributes restored");
    }
}
