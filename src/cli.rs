use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "jobmail",
    version,
    about = "Job-application mail triage and résumé tailoring"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify the newest email, then star, trash or forward it
    Triage,
    /// Read or modify the mailbox directly
    Mail {
        #[command(subcommand)]
        action: MailCommand,
    },
    /// Score how well a résumé matches a job posting
    MatchScore(JobArgs),
    /// Tailor a résumé to a job posting
    UpdateResume {
        #[command(flatten)]
        job: JobArgs,
        /// Write the updated résumé JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also render the updated résumé to PDF
        #[arg(long)]
        render: bool,
        /// PDF path (defaults to <OUTPUT_DIR>/resume.pdf)
        #[arg(long, requires = "render")]
        pdf: Option<PathBuf>,
    },
    /// Render a résumé JSON file to PDF
    Render {
        resume: PathBuf,
        /// PDF path (defaults to <OUTPUT_DIR>/resume.pdf)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Extract text from a document and parse it into résumé JSON
    Understand {
        /// Local file path or http(s) URL
        source: String,
        /// Print the extracted text and skip the parsing agent
        #[arg(long)]
        text_only: bool,
    },
    /// Run the HTTP API
    Serve {
        /// Overrides SERVER_ADDR
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum MailCommand {
    /// Print the newest email
    Latest,
    /// Star a message
    Star { id: String },
    /// Move a message to the trash
    Trash { id: String },
    /// Remove the UNREAD label from a message
    MarkRead { id: String },
}

#[derive(Args)]
pub struct JobArgs {
    /// Job posting JSON: {company_name, requirements, description}
    #[arg(long)]
    pub job: PathBuf,
    /// Résumé JSON
    #[arg(long)]
    pub resume: PathBuf,
    /// File whose contents replace the default agent instruction
    #[arg(long)]
    pub instruction: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_mail_subcommand() {
        let cli = Cli::try_parse_from(["jobmail", "mail", "mark-read", "18c"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Mail { action: MailCommand::MarkRead { ref id } } if id == "18c"
        ));
    }

    #[test]
    fn pdf_requires_render_flag() {
        let result = Cli::try_parse_from([
            "jobmail",
            "update-resume",
            "--job",
            "job.json",
            "--resume",
            "resume.json",
            "--pdf",
            "out.pdf",
        ]);
        assert!(result.is_err());
    }
}
