use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::{
    ai::{prompts, AgentClient},
    cli::{Command, JobArgs, MailCommand},
    config::{AgentConfig, AppConfig},
    document::{understand, DocumentAnalyzer, DocumentIntelligenceClient, DocumentSource},
    domain::{JobContext, MailAction, Resume},
    infrastructure::{
        directories::ResolvedPaths, notifier::TwilioWhatsApp, shutdown::ShutdownSignal,
    },
    mail::{GmailClient, MailProvider},
    render::write_resume_pdf,
    resume::{ResumeParser, ResumeUpdater},
    server::{self, AppState},
    tasks::TriageProcessor,
};

/// Wires configuration into vendor clients and runs one subcommand.
pub struct JobMailApp {
    config: AppConfig,
    paths: ResolvedPaths,
    http: Client,
}

impl JobMailApp {
    pub fn new(config: AppConfig, paths: ResolvedPaths) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("jobmail-rust/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            config,
            paths,
            http,
        })
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Triage => self.triage().await,
            Command::Mail { action } => self.mail(action).await,
            Command::MatchScore(job) => self.match_score(&job).await,
            Command::UpdateResume {
                job,
                output,
                render,
                pdf,
            } => {
                let pdf = render.then(|| pdf.unwrap_or_else(|| self.paths.resume_pdf()));
                self.update_resume(&job, output.as_deref(), pdf.as_deref())
                    .await
            }
            Command::Render { resume, output } => {
                let output = output.unwrap_or_else(|| self.paths.resume_pdf());
                self.render(&resume, &output).await
            }
            Command::Understand { source, text_only } => {
                self.understand(&source, text_only).await
            }
            Command::Serve { addr } => {
                let addr = addr.unwrap_or_else(|| self.config.server.addr.clone());
                self.serve(&addr).await
            }
        }
    }

    fn agent(&self, config: &AgentConfig) -> Result<Arc<AgentClient>> {
        let client = AgentClient::new(self.http.clone(), config)
            .with_context(|| format!("{} agent is not configured", config.role))?;
        Ok(Arc::new(client))
    }

    fn updater(&self) -> Result<ResumeUpdater> {
        Ok(ResumeUpdater::new(self.agent(&self.config.updating_agent)?))
    }

    async fn mailbox(&self) -> Result<GmailClient> {
        GmailClient::connect(self.http.clone(), &self.config.gmail).await
    }

    async fn triage(&self) -> Result<()> {
        // fail on missing messaging settings before touching the mailbox
        let messenger = Arc::new(TwilioWhatsApp::new(
            self.http.clone(),
            &self.config.messaging,
        )?);
        let updater = Arc::new(self.updater()?);
        let mailbox = Arc::new(self.mailbox().await?);

        let outcome = TriageProcessor::new(mailbox, updater, messenger)
            .run_once()
            .await?;
        println!("{outcome}");
        Ok(())
    }

    async fn mail(&self, action: MailCommand) -> Result<()> {
        let mailbox = self.mailbox().await?;
        let (id, action) = match action {
            MailCommand::Latest => {
                match mailbox.latest().await? {
                    Some(email) => {
                        println!("From: {}", email.sender);
                        println!("Id: {}", email.id);
                        println!("Subject: {}", email.subject);
                        println!();
                        println!("{}", email.body);
                    }
                    None => println!("No emails found."),
                }
                return Ok(());
            }
            MailCommand::Star { id } => (id, MailAction::Star),
            MailCommand::Trash { id } => (id, MailAction::Trash),
            MailCommand::MarkRead { id } => (id, MailAction::MarkRead),
        };
        let ack = mailbox.apply(&id, action).await?;
        println!("{}", serde_json::to_string_pretty(&ack)?);
        Ok(())
    }

    async fn match_score(&self, args: &JobArgs) -> Result<()> {
        let (job, resume, instruction) = load_job_inputs(args, prompts::MATCH_SCORE).await?;
        match self.updater()?.match_score(&job, &resume, &instruction).await? {
            Some(score) => println!("{}", serde_json::to_string_pretty(&score)?),
            None => println!("The agent reply could not be read as a match score."),
        }
        Ok(())
    }

    async fn update_resume(
        &self,
        args: &JobArgs,
        output: Option<&Path>,
        pdf: Option<&Path>,
    ) -> Result<()> {
        let (job, resume, instruction) = load_job_inputs(args, prompts::UPDATE_RESUME).await?;
        let updated = self.updater()?.update(&job, &resume, &instruction).await?;

        let pretty = serde_json::to_string_pretty(&updated)?;
        match output {
            Some(path) => {
                tokio::fs::write(path, &pretty)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Updated résumé written to {}", path.display());
            }
            None => println!("{pretty}"),
        }

        if let Some(pdf) = pdf {
            let resume = Resume::from_value(&updated).context("updated résumé has an unexpected shape")?;
            write_resume_pdf(&resume, pdf).await?;
            println!("Résumé PDF written to {}", pdf.display());
        }
        Ok(())
    }

    async fn render(&self, resume: &Path, output: &Path) -> Result<()> {
        let value: Value = read_json(resume).await?;
        let resume = Resume::from_value(&value)
            .with_context(|| format!("{} is not a résumé object", resume.display()))?;
        write_resume_pdf(&resume, output).await?;
        println!("Résumé PDF written to {}", output.display());
        Ok(())
    }

    async fn understand(&self, source: &str, text_only: bool) -> Result<()> {
        let analyzer = DocumentIntelligenceClient::new(self.http.clone(), &self.config.understander)?;
        let source = match Url::parse(source) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => DocumentSource::Url(url.into()),
            _ => DocumentSource::Path(PathBuf::from(source)),
        };

        let text = understand(&analyzer, source).await?;
        if text_only {
            print!("{text}");
            return Ok(());
        }

        let parser = ResumeParser::new(self.agent(&self.config.parser_agent)?);
        let parsed = parser.parse(&text).await?;
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        Ok(())
    }

    async fn serve(&self, addr: &str) -> Result<()> {
        let updater = match self.updater() {
            Ok(updater) => Some(Arc::new(updater)),
            Err(err) => {
                tracing::warn!(target: "server", error = ?err, "résumé updates disabled");
                None
            }
        };
        let analyzer = match DocumentIntelligenceClient::new(self.http.clone(), &self.config.understander) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn DocumentAnalyzer>),
            Err(err) => {
                tracing::warn!(target: "server", error = ?err, "document analysis disabled");
                None
            }
        };

        let state = AppState { updater, analyzer };
        server::serve(state, addr, ShutdownSignal::install()).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

async fn load_job_inputs(args: &JobArgs, default_instruction: &str) -> Result<(JobContext, Value, String)> {
    let job: JobContext = read_json(&args.job).await?;
    let resume: Value = read_json(&args.resume).await?;
    let instruction = match &args.instruction {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => default_instruction.to_string(),
    };
    Ok((job, resume, instruction))
}
