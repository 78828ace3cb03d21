use std::{fs, path::PathBuf};

use anyhow::Context as _;
use tapster_vision::perceive;
use tracing::info;

use crate::command::AppConfig;

#[derive(Debug, Clone, clap::Args)]
pub struct ClassifyArg {
    /// Screenshot to classify (PNG)
    image: PathBuf,
    /// Optional JSON config overriding the default rule tables
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the snapshot JSON here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// Money HUD reading to embed in the snapshot
    #[arg(long, default_value_t = 0)]
    money: i64,
    /// Stars HUD reading to embed in the snapshot
    #[arg(long, default_value_t = 0)]
    stars: i64,
}

pub fn run(arg: &ClassifyArg) -> anyhow::Result<()> {
    let config = AppConfig::load(arg.config.as_deref())?;

    let frame = image::open(&arg.image)
        .with_context(|| format!("Failed to open image: {}", arg.image.display()))?
        .to_rgb8();
    let image_shape = frame.dimensions();

    let perception = perceive(&frame, &config.perception);
    let snapshot = perception.into_snapshot(image_shape, arg.money, arg.stars, Vec::new());
    info!(
        objects = snapshot.objects.len(),
        sig = %snapshot.color_sig,
        "classified frame"
    );

    let json = serde_json::to_string_pretty(&snapshot)?;
    match &arg.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
