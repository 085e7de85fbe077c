use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use qrv_decode::CropRegion;

#[derive(Parser)]
#[command(
    name = "qrv",
    about = "QRV — scan QR codes from images and the clipboard",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Keep persisted results under this directory instead of the default
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode a QR code from an image file
    Scan(ScanArgs),
    /// Decode a QR code from the image on the clipboard
    Paste(PasteArgs),
    /// List stored scan results
    List(ListArgs),
    /// Show one result in detail
    Show(ShowArgs),
    /// Copy a result's text to the clipboard
    Copy(CopyArgs),
    /// Delete one result
    Delete(DeleteArgs),
    /// Delete all results
    Clear(ClearArgs),
    /// Delete results older than the retention window
    Prune(PruneArgs),
}

#[derive(Args)]
pub struct ScanArgs {
    /// Path of the image to decode
    pub image: PathBuf,
    /// Decode only this region of the image, as X,Y,WxH in pixels
    #[arg(long, value_name = "X,Y,WxH")]
    pub crop: Option<CropRegion>,
}

#[derive(Args)]
pub struct PasteArgs {}

#[derive(Args)]
pub struct ListArgs {
    /// Show full ids and untruncated text
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Result id (a unique prefix is enough)
    pub id: String,
    /// Write the stored image to this path
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

#[derive(Args)]
pub struct CopyArgs {
    /// Result id (a unique prefix is enough)
    pub id: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Result id (a unique prefix is enough)
    pub id: String,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct PruneArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}
