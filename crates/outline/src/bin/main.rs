use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use outline::{Connectivity, Metadata, OutlineConfig, OutlinePlugin};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Outline an image and print the spline annotations as JSON
    Outline {
        /// Image to outline (a synthetic disk is used when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the simplification ratio
        #[arg(long)]
        ratio: Option<f64>,
        /// Override the pixel connectivity (four or eight)
        #[arg(long)]
        connectivity: Option<Connectivity>,
        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the JSON schema of the configuration file
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Outline {
            input,
            config,
            ratio,
            connectivity,
            output,
        } => {
            let mut config = match config {
                Some(path) => OutlineConfig::from_file(&path)
                    .wrap_err_with(|| format!("loading configuration {}", path.display()))?,
                None => OutlineConfig::default(),
            };
            if let Some(ratio) = ratio {
                config.simplification_ratio = ratio;
            }
            if let Some(connectivity) = connectivity {
                config.connectivity = connectivity;
            }
            run_outline(config, input.as_deref(), output.as_deref())?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&OutlineConfig::schema())?);
        }
    }

    Ok(())
}

fn run_outline(config: OutlineConfig, input: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let image = match input {
        Some(path) => {
            info!("Reading {}", path.display());
            image::open(path).wrap_err_with(|| format!("opening {}", path.display()))?
        }
        None => {
            info!("No input given, outlining a synthetic disk");
            DynamicImage::ImageLuma8(create_disk_image())
        }
    };

    let plugin = OutlinePlugin::with_json_annotations(config)?;
    let (_, metadata, annotations) = plugin.call(image, Metadata::new(), Vec::new())?;

    let report = serde_json::json!({
        "annotations": annotations,
        "metadata": metadata,
    });
    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("Wrote {} annotations to {}", annotations.len(), path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn create_disk_image() -> GrayImage {
    let mut img = GrayImage::new(100, 100);
    draw_filled_circle_mut(&mut img, (50, 50), 20, Luma([255u8]));
    img
}
