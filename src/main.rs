//! Command-line interface for the image classifier pipeline.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use visionpipe::backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
use visionpipe::dataset::ImageFolderDataset;
use visionpipe::evaluation::Evaluator;
use visionpipe::inference::Predictor;
use visionpipe::training::{Trainer, TrainerConfig};
use visionpipe::utils::logging::{init_logging, LogConfig};

/// Image classifier lifecycle pipeline: train, evaluate, and run inference.
#[derive(Parser, Debug)]
#[command(name = "visionpipe")]
#[command(version)]
#[command(about = "Train, evaluate, and serve an image classifier", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train the classifier and keep the best checkpoint
    Train {
        /// Dataset directory containing train/ and val/ partitions
        #[arg(short, long, default_value = "../data")]
        data_dir: String,

        /// Number of training epochs
        #[arg(short, long, default_value = "10")]
        epochs: usize,

        /// Batch size
        #[arg(short, long, default_value = "64")]
        batch_size: usize,

        /// Learning rate
        #[arg(long, default_value = "0.001")]
        lr: f64,

        /// Weight decay
        #[arg(long, default_value = "0.0001")]
        weight_decay: f64,

        /// Number of output classes
        #[arg(short, long, default_value = "10")]
        num_classes: usize,

        /// Directory for the best-checkpoint slot
        #[arg(long, default_value = "../checkpoints")]
        checkpoint_dir: PathBuf,

        /// Directory for the per-epoch metrics history
        #[arg(long, default_value = "../logs")]
        log_dir: PathBuf,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Disable horizontal-flip augmentation
        #[arg(long, default_value = "false")]
        no_augment: bool,
    },

    /// Evaluate a checkpoint over the validation partition
    Evaluate {
        /// Dataset directory containing the val/ partition
        #[arg(short, long, default_value = "../data")]
        data_dir: String,

        /// Batch size
        #[arg(short, long, default_value = "64")]
        batch_size: usize,

        /// Number of output classes
        #[arg(short, long, default_value = "10")]
        num_classes: usize,

        /// Path to the checkpoint file
        #[arg(long, default_value = "../checkpoints/best.mpk")]
        checkpoint_path: PathBuf,
    },

    /// Predict the class of a single image file
    Infer {
        /// Path to the input image
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the checkpoint file
        #[arg(long, default_value = "../checkpoints/best.mpk")]
        checkpoint_path: PathBuf,

        /// Number of output classes
        #[arg(short, long, default_value = "10")]
        num_classes: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    match cli.command {
        Commands::Train {
            data_dir,
            epochs,
            batch_size,
            lr,
            weight_decay,
            num_classes,
            checkpoint_dir,
            log_dir,
            seed,
            no_augment,
        } => cmd_train(
            &data_dir,
            TrainerConfig {
                epochs,
                batch_size,
                learning_rate: lr,
                weight_decay,
                num_classes,
                seed,
                augment: !no_augment,
                checkpoint_dir,
                log_dir,
            },
        ),

        Commands::Evaluate {
            data_dir,
            batch_size,
            num_classes,
            checkpoint_path,
        } => cmd_evaluate(&data_dir, batch_size, num_classes, &checkpoint_path),

        Commands::Infer {
            input,
            checkpoint_path,
            num_classes,
        } => cmd_infer(&input, &checkpoint_path, num_classes),
    }
}

fn cmd_train(data_dir: &str, config: TrainerConfig) -> Result<()> {
    // Configuration is validated before any dataset or model work
    let trainer = Trainer::new(config)?;
    let config = trainer.config();

    println!("{}", "Training configuration:".cyan().bold());
    println!("  Data dir:      {}", data_dir);
    println!("  Epochs:        {}", config.epochs);
    println!("  Batch size:    {}", config.batch_size);
    println!("  Learning rate: {}", config.learning_rate);
    println!("  Weight decay:  {}", config.weight_decay);
    println!("  Classes:       {}", config.num_classes);
    println!("  Backend:       {}", backend_name());
    println!();

    let train_dir = PathBuf::from(data_dir).join("train");
    let val_dir = PathBuf::from(data_dir).join("val");

    info!("Loading training partition from {:?}", train_dir);
    let train_set = ImageFolderDataset::new(&train_dir)?.into_memory()?;
    info!("Loading validation partition from {:?}", val_dir);
    let val_set = ImageFolderDataset::new(&val_dir)?.into_memory()?;

    let device = default_device();
    let report = trainer.run::<TrainingBackend>(&train_set, &val_set, &device)?;

    println!();
    println!("{}", "Training complete".green().bold());
    println!("  Best validation accuracy: {:.4}", report.best_val_accuracy);
    println!("  Checkpoint promotions:    {}", report.promotions);
    println!("  Checkpoint slot:          {:?}", config.checkpoint_dir.join("best.mpk"));

    Ok(())
}

fn cmd_evaluate(
    data_dir: &str,
    batch_size: usize,
    num_classes: usize,
    checkpoint_path: &PathBuf,
) -> Result<()> {
    let evaluator = Evaluator::new(batch_size, num_classes)?;

    let val_dir = PathBuf::from(data_dir).join("val");
    info!("Loading evaluation partition from {:?}", val_dir);
    let dataset = ImageFolderDataset::new(&val_dir)?.into_memory()?;

    let device = default_device();
    let report = evaluator.run::<DefaultBackend>(checkpoint_path, &dataset, &device)?;

    println!("Accuracy: {:.4}", report.accuracy);
    println!("{}", report.confusion.display());

    Ok(())
}

fn cmd_infer(input: &PathBuf, checkpoint_path: &PathBuf, num_classes: usize) -> Result<()> {
    let device = default_device();
    let predictor =
        Predictor::<DefaultBackend>::from_checkpoint(checkpoint_path, num_classes, device)?;

    let bytes = std::fs::read(input)?;
    let prediction = predictor.predict(&bytes)?;

    println!("{}", "Prediction:".cyan().bold());
    println!("  Input:      {:?}", input);
    println!("  Class:      {}", prediction.class_index);
    println!("  Confidence: {:.4}", prediction.confidence);

    Ok(())
}
