use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "caseforge")]
#[command(about = "Test case pattern analysis and generation scaffolding for TestRail and Jira", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every test case of the configured TestRail project
    Extract {
        /// Knowledge base file to write
        #[arg(short, long, default_value = "knowledgebase/existing_test_cases.json")]
        output: PathBuf,
    },

    /// Analyze existing cases and features, then write the generation prompt
    Prompt {
        /// Knowledge base file (overrides [paths] in the config file)
        #[arg(long = "knowledge-base")]
        knowledge_base: Option<PathBuf>,

        /// Directory holding feature documents
        #[arg(long)]
        features: Option<PathBuf>,

        /// Directory receiving prompt_data.json and generation_prompt.md
        #[arg(long)]
        target: Option<PathBuf>,

        /// Configuration file (defaults to the nearest .caseforge.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Push generated test cases to TestRail
    Save {
        /// Generated test cases
        #[arg(short, long, default_value = "target/generated_test_cases.json")]
        input: PathBuf,

        /// Target section (defaults to TARGET_SECTION_ID)
        #[arg(short, long)]
        section: Option<u64>,

        /// Print the TestRail payloads instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Save a Jira ticket as a feature document
    FetchTicket {
        /// Ticket key such as PROJ-123 (defaults to JIRA_TICKET_ID)
        ticket: Option<String>,

        /// Directory receiving ticket_details_<ID>.json
        #[arg(short, long, default_value = "feature")]
        output_dir: PathBuf,

        /// Skip downloading attachments
        #[arg(long)]
        no_attachments: bool,
    },

    /// Create a default .caseforge.toml and the artifact directories
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },
}
