use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::clients::{JiraClient, TicketDetails};
use crate::config::JiraConfig;
use crate::formatting::Console;
use crate::io;

const PREVIEW_CHARS: usize = 200;

pub struct FetchTicketConfig {
    pub ticket: Option<String>,
    pub output_dir: PathBuf,
    pub download_attachments: bool,
}

/// Save a Jira ticket as a feature document, with its attachments.
pub fn fetch_ticket(config: FetchTicketConfig, console: &Console) -> Result<PathBuf> {
    let jira = JiraConfig::from_env().context("Jira is not configured")?;
    let ticket = config
        .ticket
        .or(jira.ticket_id.clone())
        .context("No ticket given. Pass one or set JIRA_TICKET_ID.")?;

    let client = JiraClient::new(&jira)?;
    let server = client
        .server_title()
        .with_context(|| format!("Failed to connect to Jira at {}", jira.url))?;
    println!("{}", console.success(&format!("Connected to Jira: {server}")));

    println!("{}", console.info(&format!("Fetching details for ticket: {ticket}")));
    let details = client
        .ticket_details(&ticket)
        .with_context(|| format!("Failed to fetch ticket {ticket}"))?
        .with_context(|| format!("Ticket {ticket} not found"))?;

    let path = config.output_dir.join(details.file_name());
    io::write_json_pretty(&path, &details)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{}", console.success(&format!("Ticket details saved to: {}", path.display())));
    println!("{}", ticket_summary(&details));

    if config.download_attachments && !details.attachments.is_empty() {
        download_attachments(&client, &details, &config.output_dir.join("attachments"), console)?;
    }
    Ok(path)
}

fn download_attachments(
    client: &JiraClient,
    details: &TicketDetails,
    dir: &Path,
    console: &Console,
) -> Result<()> {
    io::ensure_dir(dir)?;
    println!(
        "{}",
        console.info(&format!(
            "Downloading {} attachments to {}",
            details.attachments.len(),
            dir.display()
        ))
    );
    for attachment in &details.attachments {
        if attachment.url.is_empty() || attachment.filename.is_empty() {
            continue;
        }
        // Attachment names come from Jira users; keep only the final component.
        let Some(name) = Path::new(&attachment.filename).file_name() else {
            continue;
        };
        let dest = dir.join(name);
        match client.download(&attachment.url, &dest) {
            Ok(bytes) => println!(
                "{}",
                console.success(&format!("{} ({} bytes)", dest.display(), bytes))
            ),
            Err(e) => {
                warn!("Failed to download {}: {}", attachment.filename, e);
                println!(
                    "{}",
                    console.error(&format!("Failed to download {}", attachment.filename))
                );
            }
        }
    }
    Ok(())
}

/// Console summary of a fetched ticket.
pub fn ticket_summary(details: &TicketDetails) -> String {
    let mut out = format!(
        "Ticket ID: {}\n{}\nSummary: {}\n",
        details.ticket_id,
        "=".repeat(60),
        details.summary
    );
    if !details.description.is_empty() {
        let preview = match details.description.char_indices().nth(PREVIEW_CHARS) {
            Some((cut, _)) => format!("{}...", &details.description[..cut]),
            None => details.description.clone(),
        };
        out.push_str(&format!("\nDescription Preview:\n{preview}\n"));
    }
    if !details.attachments.is_empty() {
        out.push_str(&format!("\nAttachments ({}):\n", details.attachments.len()));
        for (i, attachment) in details.attachments.iter().enumerate() {
            out.push_str(&format!(
                "  {}. {} ({} bytes)\n",
                i + 1,
                attachment.filename,
                attachment.size
            ));
        }
    }
    out
}
