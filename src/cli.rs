use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfdesk")]
#[command(about = "Merge, convert and trim PDFs from the command line or as an MCP server")]
#[command(version)]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server over stdio
    Mcp,

    /// Display PDF metadata and page count
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Combine multiple PDFs into one
    Merge {
        /// PDF files to merge, in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert images into a PDF with one page per image
    #[command(alias = "img2pdf")]
    Images {
        /// Image files (png, jpeg, bmp, tiff, webp, gif)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Resolution used to size pages from image pixels
        #[arg(long, default_value = "72")]
        dpi: f32,
    },

    /// Delete pages from a PDF
    #[command(alias = "rm")]
    Delete {
        /// PDF file to edit
        path: PathBuf,

        /// Pages to delete, counted from 1 (e.g., "2,5-7,9")
        pages: String,

        /// Output file (default: <name>_edited.pdf next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Keep only the selected pages of a PDF
    #[command(alias = "cat")]
    Extract {
        /// PDF file to extract from
        path: PathBuf,

        /// Pages to keep, counted from 1 (e.g., "1-5,10")
        pages: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Validate a page selection and print it in canonical form
    Pages {
        /// Page selection (e.g., "9,2,5-7")
        spec: String,

        /// Reject pages beyond this count
        #[arg(short, long)]
        total: Option<u32>,
    },
}
