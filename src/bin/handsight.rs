//! Handsight CLI - Command-line interface for Handsight
//!
//! Commands:
//! - replay: Process a recorded frame stream into frame reports (batch mode)
//! - run: Process streaming frames from stdin (streaming mode)
//! - validate: Validate frame records against the schema
//! - doctor: Diagnose configuration and input health
//! - schema: Print the input record layout

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use handsight::engines::FaultStrategy;
use handsight::interpret::ExerciseDefinition;
use handsight::pipeline::{FrameReport, HandSession};
use handsight::schema::{FrameAdapter, FrameRecord, ValidationError, FRAME_SCHEMA_VERSION};
use handsight::types::{Landmark, LandmarkFrame, Viewport, LANDMARK_COUNT};
use handsight::{HandError, HANDSIGHT_VERSION, PRODUCER_NAME};

/// Handsight - Frame-by-frame reliability classification for hand landmarks
#[derive(Parser)]
#[command(name = "handsight")]
#[command(author = "Synheart AI Inc")]
#[command(version = HANDSIGHT_VERSION)]
#[command(about = "Classify the reliability of tracked hand landmarks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a recorded frame stream into frame reports (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        session: SessionArgs,

        /// Write the session summary to stderr when done
        #[arg(long)]
        summary: bool,
    },

    /// Process streaming frames from stdin (streaming mode)
    Run {
        #[command(flatten)]
        session: SessionArgs,

        /// Flush output after each report
        #[arg(long, default_value = "true")]
        flush: bool,

        /// Emit the session summary as the final line
        #[arg(long)]
        summary: bool,
    },

    /// Validate frame records against the schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "auto")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and input health
    Doctor {
        /// Check a recorded frame stream
        #[arg(long)]
        frames: Option<PathBuf>,

        #[command(flatten)]
        session: SessionArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the input record layout
    Schema {
        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,

        /// Print an example record instead
        #[arg(long, conflicts_with = "json_schema")]
        example: bool,
    },
}

/// Session configuration shared by every processing command
#[derive(Args)]
struct SessionArgs {
    /// Surface width in pixels
    #[arg(long, default_value = "640")]
    width: f64,

    /// Surface height in pixels
    #[arg(long, default_value = "480")]
    height: f64,

    /// Mirror horizontally (selfie camera preview)
    #[arg(long)]
    mirror: bool,

    /// Exercise: all, isolation:<finger,...> or pinch:<a>,<b>
    #[arg(long, default_value = "all")]
    exercise: String,

    /// Finger fault classifier to report verdicts from
    #[arg(long, default_value = "segment-scored")]
    fault_strategy: FaultStrategyArg,
}

impl SessionArgs {
    fn viewport(&self) -> Result<Viewport, HandCliError> {
        let viewport = Viewport::new(self.width, self.height)?;
        Ok(if self.mirror { viewport.mirrored() } else { viewport })
    }

    fn session(&self) -> Result<HandSession, HandCliError> {
        let exercise: ExerciseDefinition = self.exercise.parse()?;
        Ok(HandSession::with_exercise(exercise).with_fault_strategy(self.fault_strategy.into()))
    }
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Detect from the first character
    Auto,
    /// Newline-delimited JSON (one frame per line)
    Ndjson,
    /// JSON array of frames
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one report per line)
    Ndjson,
    /// JSON array of reports
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum FaultStrategyArg {
    /// Segment-level scoring with locked positions and revive windows
    SegmentScored,
    /// Fingertip confidence with an unobservable-frame counter
    TipConfidence,
}

impl From<FaultStrategyArg> for FaultStrategy {
    fn from(arg: FaultStrategyArg) -> Self {
        match arg {
            FaultStrategyArg::SegmentScored => FaultStrategy::SegmentScored,
            FaultStrategyArg::TipConfidence => FaultStrategy::TipConfidence,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), HandCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            session,
            summary,
        } => cmd_replay(&input, &output, input_format, output_format, &session, summary),

        Commands::Run { session, flush, summary } => cmd_run(&session, flush, summary),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { frames, session, json } => cmd_doctor(frames.as_deref(), &session, json),

        Commands::Schema { json_schema, example } => cmd_schema(json_schema, example),
    }
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    args: &SessionArgs,
    summary: bool,
) -> Result<(), HandCliError> {
    let input_data = read_input(input)?;
    let records = parse_records(&input_data, &input_format)?;

    if records.is_empty() {
        return Err(HandCliError::NoFrames);
    }

    let viewport = args.viewport()?;
    let mut session = args.session()?;
    info!(session_id = %session.session_id(), frames = records.len(), "replay started");

    let mut reports: Vec<FrameReport> = Vec::new();
    for record in &records {
        if let Some(report) = session.process_record(record, &viewport)? {
            reports.push(report);
        }
    }

    if reports.is_empty() {
        return Err(HandCliError::NoReports);
    }

    let output_data = format_output(&reports, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    if summary {
        eprintln!("{}", serde_json::to_string(&session.summary())?);
    }

    Ok(())
}

fn cmd_run(args: &SessionArgs, flush: bool, summary: bool) -> Result<(), HandCliError> {
    let viewport = args.viewport()?;
    let mut session = args.session()?;
    info!(session_id = %session.session_id(), "streaming session started");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let record: FrameRecord = serde_json::from_str(trimmed)
            .map_err(|e| HandCliError::ParseError(format!("Failed to parse frame: {}", e)))?;

        match session.process_record(&record, &viewport)? {
            Some(report) => {
                writeln!(stdout, "{}", serde_json::to_string(&report)?)?;
                if flush {
                    stdout.flush()?;
                }
            }
            None => debug!(timestamp_ms = record.timestamp_ms, "no report for frame"),
        }
    }

    if summary {
        writeln!(stdout, "{}", serde_json::to_string(&session.summary())?)?;
    }
    stdout.flush()?;

    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), HandCliError> {
    let input_data = read_input(input)?;
    let records = parse_records(&input_data, &input_format)?;

    let results = FrameAdapter::validate_frames(&records);

    let report = ValidationReport {
        total_frames: records.len(),
        valid_frames: records.len() - results.len(),
        invalid_frames: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                frame_id: r.frame_id.clone(),
                timestamp_ms: r.timestamp_ms,
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total frames:   {}", report.total_frames);
        println!("Valid frames:   {}", report.valid_frames);
        println!("Invalid frames: {}", report.invalid_frames);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Frame {} (index {}, t={}ms): {}",
                    err.frame_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.timestamp_ms,
                    err.error
                );
            }
        }
    }

    if report.invalid_frames > 0 {
        Err(HandCliError::ValidationFailed(report.invalid_frames))
    } else {
        Ok(())
    }
}

fn cmd_doctor(frames: Option<&Path>, args: &SessionArgs, json: bool) -> Result<(), HandCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "handsight_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Handsight version {}", HANDSIGHT_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", FRAME_SCHEMA_VERSION),
    });

    checks.push(match args.viewport() {
        Ok(v) => DoctorCheck {
            name: "viewport".to_string(),
            status: CheckStatus::Ok,
            message: format!("{}x{} px{}", v.width, v.height, if v.mirror_x { ", mirrored" } else { "" }),
        },
        Err(e) => DoctorCheck {
            name: "viewport".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    checks.push(match args.exercise.parse::<ExerciseDefinition>() {
        Ok(exercise) => DoctorCheck {
            name: "exercise".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Targets: {}",
                exercise
                    .target_fingers()
                    .iter()
                    .map(|f| f.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        },
        Err(e) => DoctorCheck {
            name: "exercise".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    if let Some(frames_path) = frames {
        checks.push(check_frames_file(frames_path));
    }

    // Check stdin is available (for streaming mode)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: HANDSIGHT_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Handsight Doctor Report");
        println!("=======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(HandCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_frames_file(path: &Path) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: "frames".to_string(),
            status: CheckStatus::Warning,
            message: "Frames file does not exist".to_string(),
        };
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return DoctorCheck {
                name: "frames".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read frames file: {}", e),
            }
        }
    };
    match FrameAdapter::parse_auto(&content) {
        Ok(records) if records.is_empty() => DoctorCheck {
            name: "frames".to_string(),
            status: CheckStatus::Warning,
            message: "Frames file is empty".to_string(),
        },
        Ok(records) => {
            let invalid = FrameAdapter::validate_frames(&records).len();
            DoctorCheck {
                name: "frames".to_string(),
                status: if invalid == 0 { CheckStatus::Ok } else { CheckStatus::Warning },
                message: format!("{} frames, {} invalid", records.len(), invalid),
            }
        }
        Err(e) => DoctorCheck {
            name: "frames".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    }
}

fn cmd_schema(json_schema: bool, example: bool) -> Result<(), HandCliError> {
    if json_schema {
        println!("{}", get_input_json_schema());
    } else if example {
        println!("{}", serde_json::to_string_pretty(&example_record())?);
    } else {
        println!("Input Schema: {}", FRAME_SCHEMA_VERSION);
        println!();
        println!("One record per captured frame:");
        println!();
        println!("- schema_version: \"{}\"", FRAME_SCHEMA_VERSION);
        println!("- frame_id: optional caller-assigned identifier");
        println!("- timestamp_ms: capture time in milliseconds (monotonic)");
        println!("- landmarks: {} points {{ x, y, z? }}, x/y normalized to 0-1", LANDMARK_COUNT);
        println!("  0 wrist; 1-4 thumb; 5-8 index; 9-12 middle; 13-16 ring; 17-20 pinky");
        println!("- smoothed: optional filtered landmarks, same layout");
        println!("- control: optional {{ running, paused, finished }} attempt flags");
        println!();
        println!("Output: one frame report per accepted frame (scale, regime, observation,");
        println!("plausibility, dead_finger, verdicts, reference, debug_vision, gate,");
        println!("semantic, exercise, guidance).");
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, HandCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_records(input: &str, format: &InputFormat) -> Result<Vec<FrameRecord>, HandCliError> {
    let records = match format {
        InputFormat::Auto => FrameAdapter::parse_auto(input)?,
        InputFormat::Ndjson => FrameAdapter::parse_ndjson(input)?,
        InputFormat::Json => FrameAdapter::parse_array(input)?,
    };
    Ok(records)
}

fn format_output(reports: &[FrameReport], format: &OutputFormat) -> Result<String, HandCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for report in reports {
                lines.push(serde_json::to_string(report)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(reports)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(reports)?),
    }
}

/// Flat open palm in the middle of the frame
fn example_record() -> FrameRecord {
    let landmarks = (0..LANDMARK_COUNT)
        .map(|i| {
            let finger = i.saturating_sub(1) / 4;
            let joint = i.saturating_sub(1) % 4;
            if i == 0 {
                Landmark::new(0.5, 0.8)
            } else {
                Landmark::new(0.38 + 0.06 * finger as f64, 0.6 - 0.08 * joint as f64)
            }
        })
        .collect();
    FrameRecord::from_frame(&LandmarkFrame::new(0, landmarks)).with_frame_id("example-0")
}

fn get_input_json_schema() -> String {
    let landmark = serde_json::json!({
        "type": "object",
        "required": ["x", "y"],
        "properties": {
            "x": { "type": "number" },
            "y": { "type": "number" },
            "z": { "type": "number" }
        }
    });
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/hand.landmark_frame.v1.json",
        "title": FRAME_SCHEMA_VERSION,
        "description": "Handsight landmark frame schema",
        "type": "object",
        "required": ["schema_version", "timestamp_ms", "landmarks"],
        "properties": {
            "schema_version": {
                "type": "string",
                "const": FRAME_SCHEMA_VERSION
            },
            "frame_id": { "type": "string" },
            "timestamp_ms": { "type": "integer", "minimum": 0 },
            "landmarks": {
                "type": "array",
                "minItems": LANDMARK_COUNT,
                "maxItems": LANDMARK_COUNT,
                "items": landmark
            },
            "smoothed": {
                "type": "array",
                "minItems": LANDMARK_COUNT,
                "maxItems": LANDMARK_COUNT,
                "items": landmark
            },
            "control": {
                "type": "object",
                "properties": {
                    "running": { "type": "boolean" },
                    "paused": { "type": "boolean" },
                    "finished": { "type": "boolean" }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum HandCliError {
    Io(io::Error),
    Hand(HandError),
    Json(serde_json::Error),
    Validation(ValidationError),
    NoFrames,
    NoReports,
    ValidationFailed(usize),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for HandCliError {
    fn from(e: io::Error) -> Self {
        HandCliError::Io(e)
    }
}

impl From<HandError> for HandCliError {
    fn from(e: HandError) -> Self {
        match e {
            HandError::InvalidFrame(v) => HandCliError::Validation(v),
            other => HandCliError::Hand(other),
        }
    }
}

impl From<serde_json::Error> for HandCliError {
    fn from(e: serde_json::Error) -> Self {
        HandCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HandCliError> for CliError {
    fn from(e: HandCliError) -> Self {
        match e {
            HandCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HandCliError::Hand(e @ HandError::InvalidViewport(_)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("--width and --height must be positive".to_string()),
            },
            HandCliError::Hand(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!("Ensure input matches {} schema", FRAME_SCHEMA_VERSION)),
            },
            HandCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            HandCliError::Validation(e) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'handsight validate' for details".to_string()),
            },
            HandCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frames found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            HandCliError::NoReports => CliError {
                code: "NO_REPORTS".to_string(),
                message: "Every frame was rejected".to_string(),
                hint: Some("Check landmark counts and coordinates with 'handsight validate'".to_string()),
            },
            HandCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} frames failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            HandCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            HandCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    total_frames: usize,
    valid_frames: usize,
    invalid_frames: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    index: usize,
    frame_id: Option<String>,
    timestamp_ms: u64,
    error: String,
}

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
