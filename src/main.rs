use clap::{Parser, Subcommand};
use homework_lens::services::classifier::model_manager::ModelManager;
use homework_lens::{AppError, Decision, HomeworkClassifier, Organizer, OrganizerConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_PARTIAL: u8 = 1;
const EXIT_SETUP: u8 = 2;

#[derive(Parser)]
#[command(name = "homework-lens")]
#[command(about = "Sort homework-related photos out of a photo folder", long_about = None)]
struct Cli {
    /// JSON config file overriding keywords/thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Where the ONNX model and its labels are cached
    #[arg(long, global = true, default_value = "models")]
    model_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a folder and move homework images to a destination folder
    Organize {
        /// Directory containing photos to organize
        source_dir: PathBuf,

        /// Directory where homework photos will be moved
        #[arg(long, default_value = "school_photos")]
        dest_dir: PathBuf,

        /// Simulate the run without moving anything
        #[arg(long)]
        dry_run: bool,

        /// Confidence threshold for keyword matches
        #[arg(long)]
        threshold: Option<f32>,

        /// Also scan subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Classify a single image and print the verdict
    Classify {
        /// Image file to classify
        image: PathBuf,

        /// Confidence threshold for keyword matches
        #[arg(long)]
        threshold: Option<f32>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(EXIT_SETUP)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let mut config = match &cli.config {
        Some(path) => OrganizerConfig::load(path)?,
        None => OrganizerConfig::default(),
    };

    let manager = ModelManager::new(cli.model_dir.clone());
    if !manager.is_downloaded() {
        info!("model not cached yet, downloading");
        manager.download_model().await?;
    }
    let oracle = manager.load_oracle()?;

    match cli.command {
        Commands::Organize {
            source_dir,
            dest_dir,
            dry_run,
            threshold,
            recursive,
        } => {
            config.recursive = config.recursive || recursive;
            let threshold = threshold.unwrap_or(config.confidence_threshold);
            let classifier = HomeworkClassifier::new(Box::new(oracle), config.clone());
            let organizer = Organizer::new(classifier, config);

            let (report, stats) = organizer.organize(&source_dir, &dest_dir, dry_run, threshold)?;

            for record in &report {
                match record.decision {
                    Decision::Moved => {
                        let dest = record
                            .destination
                            .as_ref()
                            .map(|d| d.display().to_string())
                            .unwrap_or_default();
                        println!(
                            "{} moved: {} -> {} ({}, {:.1}%)",
                            if dry_run { "[dry run] would be" } else { "✓" },
                            record.source.display(),
                            dest,
                            record.reason,
                            record.confidence * 100.0
                        );
                    }
                    Decision::Kept => {
                        println!("○ kept: {} ({})", record.source.display(), record.reason)
                    }
                    Decision::Error => {
                        println!("✗ error: {} ({})", record.source.display(), record.reason)
                    }
                }
            }

            println!(
                "\nscanned {} | moved {} | kept {} | errors {}",
                stats.total_scanned, stats.total_moved, stats.total_kept, stats.total_errors
            );

            if stats.total_errors > 0 {
                Ok(ExitCode::from(EXIT_PARTIAL))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Commands::Classify { image, threshold } => {
            let threshold = threshold.unwrap_or(config.confidence_threshold);
            let size = std::fs::metadata(&image).map(|m| m.len()).unwrap_or(0);
            let image = homework_lens::ImageRef::new(image, size);
            let classifier = HomeworkClassifier::new(Box::new(oracle), config);

            let result = classifier.classify(&image, threshold);
            Ok(ExitCode::from(report_classification(&image, result)))
        }
    }
}

/// Print the single-image verdict and map it to an exit code. A decode or
/// oracle failure on the image is a per-image error, not a setup failure.
fn report_classification(
    image: &homework_lens::ImageRef,
    result: Result<homework_lens::ClassificationResult, AppError>,
) -> u8 {
    match result {
        Ok(result) => {
            println!("image: {}", image.path.display());
            println!("homework-related: {}", if result.is_homework { "YES" } else { "NO" });
            println!("confidence: {:.1}%", result.confidence * 100.0);
            println!("reason: {}", result.reason);
            if let Some(label) = &result.matched_label {
                println!("matched label: {}", label);
            }
            for p in &result.predictions {
                println!("  {:<30} {:.1}%", p.class_name, p.confidence * 100.0);
            }
            0
        }
        Err(e) => {
            println!("✗ error: {} ({})", image.path.display(), e);
            EXIT_PARTIAL
        }
    }
}
