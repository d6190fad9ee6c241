// src/cli.rs
//! CLI dashboard: assembles the services and drives the wizard, uploads,
//! listings and the mock-interview chat.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cv_list::CvRecord;
use crate::profile_store::StructuredProfileStore;
use crate::session::SessionContext;
use crate::thumbnail;
use crate::upload::pipeline::{CancelToken, UploadObserver, UploadPhase};
use crate::upload::validate::SelectedFile;
use crate::wizard::{AlwaysReady, WizardController, WizardStep};
use crate::AppServices;

#[derive(Parser)]
#[command(name = "cv2interview")]
#[command(about = "Dashboard client for the AI interview preparation service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an account
    Signup {
        email: String,
        password: String,
        #[arg(long)]
        full_name: Option<String>,
    },
    /// Sign in; the session is remembered unless --no-remember is given
    Login {
        email: String,
        password: String,
        #[arg(long)]
        no_remember: bool,
    },
    /// Sign out and forget the remembered session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Upload a CV PDF through the processing pipeline
    Upload { file: PathBuf },
    /// List uploaded CVs with signed preview links
    Cvs,
    /// Render a first-page thumbnail of a local PDF
    Thumbnail {
        file: PathBuf,
        #[arg(long, default_value_t = 200)]
        height: u32,
        #[arg(long)]
        rotated: bool,
        #[arg(long, default_value = "thumbnail.png")]
        out: PathBuf,
    },
    /// Run the five-step onboarding wizard
    Wizard,
    /// Start a mock interview chat
    Interview,
}

pub async fn run(cli: Cli, services: AppServices) -> Result<()> {
    match cli.command {
        Command::Signup {
            email,
            password,
            full_name,
        } => {
            let session = services
                .sign_up(&email, &password, full_name.as_deref())
                .await?;
            match session {
                Some(session) => println!("Signed up and logged in as {}", session.user.email),
                None => println!("Signed up. Check your inbox to confirm the address, then login."),
            }
        }

        Command::Login {
            email,
            password,
            no_remember,
        } => {
            let session = services.sign_in(&email, &password, !no_remember).await?;
            println!("Logged in as {}", session.user.email);
        }

        Command::Logout => match services.resume_session() {
            Some(session) => {
                services.sign_out(&session).await?;
                println!("Logged out.");
            }
            None => println!("No active session."),
        },

        Command::Whoami => match services.resume_session() {
            Some(session) => {
                let user = services.auth.current_user(&session.access_token).await?;
                println!("{} <{}>", user.full_name.as_deref().unwrap_or("(no name)"), user.email);
            }
            None => println!("Not logged in."),
        },

        Command::Upload { file } => {
            let session = require_session(&services)?;
            let selected = SelectedFile::from_path(&file).await?;
            upload_and_structure(&services, &session, selected).await?;
        }

        Command::Cvs => {
            let session = require_session(&services)?;
            let records = services
                .cv_list
                .fetch(session.user_id(), &session.access_token)
                .await;
            if records.is_empty() {
                println!("No CVs uploaded yet.");
            } else {
                for record in records {
                    println!("{}  {}", record.cv_id, record.preview_url);
                }
            }
        }

        Command::Thumbnail {
            file,
            height,
            rotated,
            out,
        } => {
            let bytes = tokio::fs::read(&file).await?;
            let thumb = thumbnail::render_async(bytes, height, rotated).await?;
            thumb.image.save(&out)?;
            println!(
                "Rendered {}x{} thumbnail to {}",
                thumb.width(),
                thumb.height(),
                out.display()
            );
        }

        Command::Wizard => {
            let session = require_session(&services)?;
            run_wizard(&services, &session).await?;
        }

        Command::Interview => {
            let mut interview = services.interview()?;
            println!("Session: {}", interview.session_id());
            println!();
            println!("{}", interview.current_question());
            loop {
                let answer = prompt("> ")?;
                if answer.is_empty() || answer == "quit" {
                    break;
                }
                match interview.analyze_response(&answer).await {
                    Ok(turn) => {
                        let a = &turn.analysis;
                        println!("  Grade: {}/20", a.grade);
                        if !a.feedback.is_empty() {
                            println!("  {}", a.feedback);
                        }
                        for strength in &a.strengths {
                            println!("  + {}", strength);
                        }
                        for improvement in &a.improvements {
                            println!("  - {}", improvement);
                        }
                        println!();
                        println!("{}", turn.next_question);
                    }
                    Err(e) => {
                        println!("Analysis failed: {}", e);
                    }
                }
            }
        }
    }

    Ok(())
}

fn require_session(services: &AppServices) -> Result<SessionContext> {
    services
        .resume_session()
        .ok_or_else(|| anyhow::anyhow!("Not logged in. Run `cv2interview login <email> <password>` first."))
}

/// Observer printing pipeline milestones to the terminal.
struct CliObserver;

impl UploadObserver for CliObserver {
    fn on_phase(&self, phase: UploadPhase) {
        if phase != UploadPhase::Idle {
            println!("[{:?}]", phase);
        }
    }

    fn on_progress(&self, percent: u8) {
        if percent > 0 {
            println!("  {}%", percent);
        }
    }

    fn on_extracted(&self, text: Option<&str>) {
        if let Some(text) = text {
            let preview: String = text.chars().take(80).collect();
            println!("  extracted: {}", preview);
        }
    }

    fn on_uploaded(&self, url: &str) {
        println!("  original: {}", url);
    }

    fn on_records(&self, records: &[CvRecord]) {
        println!("  {} CV(s) on record", records.len());
    }
}

/// Run the pipeline for one file, then structure the extracted text.
/// Returns the populated profile store for the wizard to prefill from.
async fn upload_and_structure(
    services: &AppServices,
    session: &SessionContext,
    file: SelectedFile,
) -> Result<StructuredProfileStore> {
    let pipeline = services.pipeline();
    let token = CancelToken::new();

    let outcome = pipeline
        .run(Some(session), file, Arc::new(CliObserver), &token)
        .await?;

    let mut store = services.profile_store();
    store.set_extracted_text(Some(outcome.extracted_text.clone()));
    store.structure(session).await;

    if let Some(profile) = store.profile() {
        if let Some(name) = &profile.full_name {
            println!("  profile: {}", name);
        }
        if !profile.skills.is_empty() {
            println!("  skills: {}", profile.skills.join(", "));
        }
    }

    Ok(store)
}

/// Interactive five-step wizard for one dashboard visit.
async fn run_wizard(services: &AppServices, session: &SessionContext) -> Result<()> {
    let mut wizard = WizardController::new();
    let mut store = services.profile_store();
    let mut pipeline_started = false;

    loop {
        let step = wizard.current_step();
        println!();
        println!(
            "Step {}/{}: {}",
            wizard.step_number(),
            WizardStep::ALL.len(),
            step.title()
        );

        match step {
            WizardStep::Upload => {
                println!("Enter a path to your CV (PDF), or: next, quit");
            }
            WizardStep::Profile => {
                let current = if wizard.fields.full_name.is_empty() {
                    store
                        .profile()
                        .and_then(|p| p.full_name.clone())
                        .unwrap_or_default()
                } else {
                    wizard.fields.full_name.clone()
                };
                println!("Full name [{}] (or: next, back, quit)", current);
            }
            WizardStep::Story => {
                println!("Tell your story (or: next, back, quit)");
            }
            WizardStep::Services => {
                println!("Which services are you interested in? (or: next, back, quit)");
            }
            WizardStep::Budget => {
                println!("What is your budget? (or: back, done, quit)");
            }
        }

        let input = prompt("> ")?;
        match input.as_str() {
            "quit" => return Ok(()),
            "back" => {
                wizard.retreat();
            }
            "next" | "done" => {
                if wizard.is_last() {
                    break;
                }
                let advanced = if pipeline_started {
                    wizard.advance(&store)
                } else {
                    wizard.advance(&AlwaysReady)
                };
                if !advanced {
                    println!("Upload and parsing must finish before continuing.");
                }
            }
            "" => {}
            value => match step {
                WizardStep::Upload => {
                    let path = PathBuf::from(value);
                    match SelectedFile::from_path(&path).await {
                        Ok(file) => {
                            pipeline_started = true;
                            match upload_and_structure(services, session, file).await {
                                Ok(populated) => store = populated,
                                Err(e) => println!("Upload failed: {}", e),
                            }
                        }
                        Err(e) => println!("Cannot read file: {}", e),
                    }
                }
                WizardStep::Profile => wizard.fields.full_name = value.to_string(),
                WizardStep::Story => wizard.fields.story = value.to_string(),
                WizardStep::Services => wizard.fields.services = value.to_string(),
                WizardStep::Budget => wizard.fields.budget = value.to_string(),
            },
        }
    }

    println!();
    println!("All set, {}.", display_name(&wizard, &store));
    if !wizard.fields.story.is_empty() {
        println!("Story:    {}", wizard.fields.story);
    }
    if !wizard.fields.services.is_empty() {
        println!("Services: {}", wizard.fields.services);
    }
    if !wizard.fields.budget.is_empty() {
        println!("Budget:   {}", wizard.fields.budget);
    }
    Ok(())
}

fn display_name(wizard: &WizardController, store: &StructuredProfileStore) -> String {
    if !wizard.fields.full_name.is_empty() {
        return wizard.fields.full_name.clone();
    }
    store
        .profile()
        .and_then(|p| p.full_name.clone())
        .unwrap_or_else(|| "candidate".to_string())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
