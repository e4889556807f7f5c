use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use facewatch_core::detection::infrastructure::cascade_face_locator::CascadeFaceLocator;
use facewatch_core::fusion::domain::correlated_triple::CorrelatedTriple;
use facewatch_core::fusion::domain::frame_annotator::FrameAnnotator;
use facewatch_core::fusion::domain::messages::{DetectionArray, ImageMessage, RecognitionArray};
use facewatch_core::fusion::infrastructure::raster_annotator::RasterAnnotator;
use facewatch_core::pipeline::config::FacewatchConfig;
use facewatch_core::pipeline::detect_head_faces_use_case::{crop_heads, DetectHeadFacesUseCase};
use facewatch_core::pipeline::display_node::DisplayNode;
use facewatch_core::pipeline::infrastructure::image_directory_publisher::ImageDirectoryPublisher;
use facewatch_core::pipeline::infrastructure::threaded_display_executor::{
    DisplayInputs, ThreadedDisplayExecutor,
};
use facewatch_core::pipeline::node_logger::StdoutNodeLogger;
use facewatch_core::shared::constants::IMAGE_EXTENSIONS;
use facewatch_core::shared::data_dir;
use facewatch_core::shared::region::Region;
use facewatch_core::shared::timestamp::Timestamp;
use facewatch_core::video::domain::image_reader::ImageReader;
use facewatch_core::video::domain::image_writer::ImageWriter;
use facewatch_core::video::infrastructure::image_file_reader::ImageFileReader;
use facewatch_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Head-constrained face detection and annotated display of recognition results.
#[derive(Parser)]
#[command(name = "facewatch")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find faces inside the given head boxes of one image.
    Detect(DetectArgs),
    /// Draw detections and recognitions onto one image.
    Annotate(AnnotateArgs),
    /// Replay a JSON-lines message log through the display node.
    Replay(ReplayArgs),
}

#[derive(Args)]
struct DetectArgs {
    /// Color image to search.
    #[arg(long)]
    frame: PathBuf,

    /// JSON array of head boxes: [{"x":..,"y":..,"width":..,"height":..}, ...].
    #[arg(long)]
    heads: PathBuf,

    /// Directory holding haarcascades/ (defaults to $FACEWATCH_DATA_DIR or the platform data dir).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window growth factor between scale passes (> 1.0).
    #[arg(long)]
    scale_step: Option<f64>,

    /// A face needs more than this many overlapping hits.
    #[arg(long)]
    min_neighbors: Option<u32>,

    /// Smallest searched window width in pixels.
    #[arg(long)]
    min_width: Option<u32>,

    /// Smallest searched window height in pixels.
    #[arg(long)]
    min_height: Option<u32>,

    /// Capture time of the frame, in seconds.
    #[arg(long, default_value = "0.0")]
    stamp: f64,

    /// Where to write the detection JSON (stdout when omitted).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct AnnotateArgs {
    /// Color image to draw on.
    #[arg(long)]
    frame: PathBuf,

    /// Detection JSON as written by `detect`.
    #[arg(long)]
    detections: PathBuf,

    /// Recognition JSON: {"stamp":..,"detections":[{"roi":..,"detector":..,"label":..}]}.
    #[arg(long)]
    recognitions: PathBuf,

    /// Output image file.
    #[arg(long)]
    output: PathBuf,
}

#[derive(Args)]
struct ReplayArgs {
    /// JSON-lines file of tagged messages.
    #[arg(long)]
    log: PathBuf,

    /// Directory receiving one PNG per annotated frame.
    #[arg(long)]
    output_dir: PathBuf,

    /// JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// One line of a replay log.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LogMessage {
    Recognitions(RecognitionArray),
    Detections(DetectionArray),
    ColorImage { stamp: Timestamp, path: PathBuf },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Detect(args) => run_detect(args),
        Command::Annotate(args) => run_annotate(args),
        Command::Replay(args) => run_replay(args),
    }
}

fn run_detect(args: DetectArgs) -> Result<(), Box<dyn std::error::Error>> {
    require_image(&args.frame)?;
    let mut config = load_config(args.config.as_deref())?;
    if let Some(v) = args.scale_step {
        config.locator.scale_step = v;
    }
    if let Some(v) = args.min_neighbors {
        config.locator.min_neighbors = v;
    }
    if let Some(v) = args.min_width {
        config.locator.min_window_width = v;
    }
    if let Some(v) = args.min_height {
        config.locator.min_window_height = v;
    }
    config.validate()?;

    let data_dir = data_dir::resolve(args.data_dir.as_deref())?;
    let locator = CascadeFaceLocator::from_data_dir(config.locator, &data_dir)?;
    let mut use_case = DetectHeadFacesUseCase::new(Box::new(locator));

    let stamp = Timestamp::try_from(args.stamp)?;
    let frame = ImageFileReader::new().read(&args.frame, stamp)?;
    let heads: Vec<Region> = read_json(&args.heads)?;

    let detections = use_case.execute(&crop_heads(&frame, &heads))?;
    let json = serde_json::to_string_pretty(&detections)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            log::info!("Detections written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_annotate(args: AnnotateArgs) -> Result<(), Box<dyn std::error::Error>> {
    require_image(&args.frame)?;
    let detections: DetectionArray = read_json(&args.detections)?;
    let recognitions: RecognitionArray = read_json(&args.recognitions)?;
    let frame = ImageFileReader::new().read(&args.frame, detections.stamp)?;

    let triple = CorrelatedTriple::new(recognitions, detections, ImageMessage::from_frame(&frame));
    let annotated = RasterAnnotator::new().annotate(&triple)?;
    ImageFileWriter::new().write(&args.output, &annotated)?;
    log::info!("Output written to {}", args.output.display());
    Ok(())
}

fn run_replay(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.log.is_file() {
        return Err(format!("Message log not found: {}", args.log.display()).into());
    }
    let config = load_config(args.config.as_deref())?;
    fs::create_dir_all(&args.output_dir)?;

    let node = DisplayNode::new(
        config.sync,
        Box::new(RasterAnnotator::new()),
        Box::new(ImageDirectoryPublisher::new(
            &args.output_dir,
            Box::new(ImageFileWriter::new()),
        )),
        Box::new(StdoutNodeLogger::default()),
    );
    let (inputs, running) = ThreadedDisplayExecutor::new().spawn(node);

    let feed_result = feed_log(&args.log, &inputs);
    drop(inputs);
    let node = running.join()?;
    feed_result?;

    log::info!(
        "Wrote {} annotated frames to {}",
        node.stats().published,
        args.output_dir.display()
    );
    Ok(())
}

/// Streams every log line into the node's inputs. Stops early if the node
/// has hung up.
fn feed_log(log_path: &Path, inputs: &DisplayInputs) -> Result<(), Box<dyn std::error::Error>> {
    let base_dir = log_path.parent().unwrap_or(Path::new("."));
    let reader = ImageFileReader::new();
    let file = BufReader::new(fs::File::open(log_path)?);

    for (n, line) in file.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let message: LogMessage = serde_json::from_str(&line)
            .map_err(|e| format!("{}:{}: {e}", log_path.display(), n + 1))?;

        let delivered = match message {
            LogMessage::Recognitions(msg) => inputs.recognitions.send(msg).is_ok(),
            LogMessage::Detections(msg) => inputs.detections.send(msg).is_ok(),
            LogMessage::ColorImage { stamp, path } => {
                let frame = reader.read(&base_dir.join(path), stamp)?;
                inputs.images.send(ImageMessage::from_frame(&frame)).is_ok()
            }
        };
        if !delivered {
            log::warn!("Display node stopped; remaining messages skipped");
            break;
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<FacewatchConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(FacewatchConfig::load(p)?),
        None => Ok(FacewatchConfig::default()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Failed to parse {}: {e}", path.display()).into())
}

fn require_image(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_file() {
        return Err(format!("Input file not found: {}", path.display()).into());
    }
    if !is_image(path) {
        return Err(format!("Unsupported image type: {}", path.display()).into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
