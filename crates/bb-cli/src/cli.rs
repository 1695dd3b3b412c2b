//! Argument definitions for `bb`.

use bb_core::BlockType;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};

#[derive(Parser)]
#[command(
    name = "bb",
    version,
    about = "Build block pages from the command line",
    long_about = "Build block pages from the command line.\n\n\
                  Pages travel as the encoded `data` query value, so every \
                  editing command prints the new state and commands chain:\n\
                  bb add \"$(bb new)\" division"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v info, -vv debug, -q errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print an empty page.
    New {
        #[arg(long, default_value = "New Page")]
        name: String,
    },

    /// Add a default block and print the new page. The id goes to stderr.
    Add {
        /// Encoded page, or `-` to read it from stdin.
        data: String,
        #[arg(value_parser = parse_block_type)]
        block_type: BlockType,
        /// Requested parent; ignored unless it is a division on the page.
        #[arg(long)]
        parent: Option<String>,
    },

    /// Merge a JSON object into a block and print the new page.
    Update {
        data: String,
        id: String,
        /// e.g. `{"text": "Buy", "onClick": "print('hi')"}`; null unsets.
        patch: String,
    },

    /// Remove a block and print the new page.
    Delete { data: String, id: String },

    /// Print the block tree.
    Tree {
        data: String,
        /// Mark this block as selected.
        #[arg(long)]
        select: Option<String>,
    },

    /// Report parent-reference problems.
    Lint { data: String },

    /// Print the page as HTML.
    Render { data: String },

    /// Click buttons in order and print their console output.
    Click {
        data: String,
        #[arg(required = true)]
        ids: Vec<String>,
        /// VM instruction budget per click.
        #[arg(long)]
        instruction_limit: Option<u64>,
    },
}

fn parse_block_type(s: &str) -> Result<BlockType, String> {
    s.parse().map_err(|e: bb_core::model::UnknownBlockType| e.to_string())
}
