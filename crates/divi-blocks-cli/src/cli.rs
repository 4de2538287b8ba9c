use clap::{Parser, Subcommand, ValueEnum};
use divi_blocks_engine::ParseMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "divi-blocks")]
#[command(author, version)]
#[command(about = "Parse Divi block content and resolve presets")]
#[command(after_help = "\
EXAMPLES:

    # Parse a page into blocks
    divi-blocks parse page.html

    # Show the module tree with ids and order indexes
    divi-blocks tree page.html --layouts-dir layouts/

    # Merge presets into a block's attributes
    divi-blocks presets --module divi/button --attrs '{\"modulePreset\":\"btn-1\"}' \\
        --presets presets.json

    # Resolve a global color
    divi-blocks color 'var(--gcid-primary)' --global-data global.json

    # Write the default config to divi-blocks.toml
    divi-blocks init")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse block content and print the blocks as JSON
    Parse {
        /// Input file (stdin if not provided)
        file: Option<PathBuf>,

        #[command(flatten)]
        parse: ParseArgs,

        /// Unwrap placeholder blocks and drop blank freeform blocks
        #[arg(long)]
        normalize: bool,

        /// Print block comment content instead of JSON
        #[arg(long)]
        serialize: bool,
    },
    /// Parse block content and print the stored module tree
    Tree {
        /// Input file (stdin if not provided)
        file: Option<PathBuf>,

        #[command(flatten)]
        parse: ParseArgs,

        /// Layout type the content is parsed as
        #[arg(long, default_value = "default")]
        layout: String,
    },
    /// Merge module and group presets into block attributes
    Presets {
        /// Module name, e.g. divi/button
        #[arg(long)]
        module: String,

        /// Block attributes as a JSON object
        #[arg(long, default_value = "{}")]
        attrs: String,

        /// Stored presets option as a JSON file
        #[arg(long)]
        presets: Option<PathBuf>,

        /// Module definitions as a JSON array of {name, attrs}
        #[arg(long)]
        modules: Option<PathBuf>,

        /// Stored global data option as a JSON file; resolves colors and variables
        #[arg(long)]
        global_data: Option<PathBuf>,

        /// Print the preset class names instead of the merged attributes
        #[arg(long)]
        classes: bool,
    },
    /// Resolve a global color reference
    Color {
        /// Color value, var(--gcid-*) or a $variable(...)$ color token
        value: String,

        /// Stored global data option as a JSON file
        #[arg(long)]
        global_data: Option<PathBuf>,

        /// Nest one hsl(from ...) per reference level instead of summing
        #[arg(long)]
        nest: bool,
    },
    /// Write the default configuration to the --config path
    Init {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args)]
pub struct ParseArgs {
    /// Context the content is parsed in
    #[arg(long, value_enum, default_value_t = Mode::Render)]
    pub mode: Mode,

    /// Directory of <post-id>.html files used as global layouts
    #[arg(long)]
    pub layouts_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Mode {
    Render,
    Retrieve,
    Migration,
    RestSave,
}

impl From<Mode> for ParseMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Render => ParseMode::Render,
            Mode::Retrieve => ParseMode::Retrieve,
            Mode::Migration => ParseMode::Migration,
            Mode::RestSave => ParseMode::RestSave,
        }
    }
}
