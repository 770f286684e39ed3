use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    /// Model to describe, `.txt` files are read as text.
    pub path: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    pub input: PathBuf,

    /// Output path. The suffix picks the encoding.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Pass the model through the host scene, merging groups that share
    /// edges and splitting them again by material.
    #[arg(long)]
    pub reconcile: bool,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Info(InfoArgs),
    Convert(ConvertArgs),
}
