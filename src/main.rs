use anyhow::Result;
use clap::Parser;
use caseforge::cli::{Cli, Commands};
use caseforge::commands::{extract, fetch_ticket, init, prompt, save};
use caseforge::config::services::load_dotenv;
use caseforge::formatting::{Console, FormattingConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();
    caseforge::logging::init_logging(cli.verbose);
    load_dotenv();

    let console = Console::new(FormattingConfig::from_env());

    match cli.command {
        Commands::Extract { output } => {
            extract::extract_test_cases(extract::ExtractConfig { output }, &console)
        }
        Commands::Prompt {
            knowledge_base,
            features,
            target,
            config,
        } => {
            let prompt_config = prompt::PromptConfig {
                knowledge_base,
                features,
                target,
                config,
            };
            prompt::generate_prompt(prompt_config, &console).map(|_| ())
        }
        Commands::Save {
            input,
            section,
            dry_run,
        } => {
            let save_config = save::SaveConfig {
                input,
                section,
                dry_run,
            };
            save::save_test_cases(save_config, &console).map(|_| ())
        }
        Commands::FetchTicket {
            ticket,
            output_dir,
            no_attachments,
        } => {
            let fetch_config = fetch_ticket::FetchTicketConfig {
                ticket,
                output_dir,
                download_attachments: !no_attachments,
            };
            fetch_ticket::fetch_ticket(fetch_config, &console).map(|_| ())
        }
        Commands::Init { force } => init::init_config(std::path::Path::new("."), force, &console),
    }
}
