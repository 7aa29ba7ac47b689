//! Interactive terminal front-end for learning a topic in depth.
//!
//! This binary provides a REPL in which a patient LLM professor walks you
//! through a topic, starting from your declared knowledge level.
//!
//! # Usage
//!
//! ```bash
//! # Start the REPL, then use /start <topic>
//! learnindeep-chat
//!
//! # Jump straight into a topic
//! learnindeep-chat --topic "Rust ownership" --level basics
//!
//! # Pick a model and temperature
//! learnindeep-chat --model llama-3.1-70b-versatile --temperature 0.3
//!
//! # Disable colors (useful for piping output)
//! learnindeep-chat --no-color
//! ```
//!
//! The API key comes from `--api-key`, the `GROQ_API_KEY` environment
//! variable, or `/key` at runtime.  Set `RUST_LOG=learnindeep=debug` to see
//! request logging on stderr.
//!
//! # Commands
//!
//! - `/start <topic>` - Start learning a topic
//! - `/level <level>` - Set knowledge level for the next topic
//! - `/reset` - End the topic and clear the conversation
//! - `/history` - Replay the conversation
//! - `/help` - Show all commands
//! - `/quit` - Exit the application

use std::path::PathBuf;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use learnindeep::chat::{
    ChatArgs, ChatCommand, ChatConfig, PlainTextRenderer, Renderer, TurnOutcome, TutorSession,
    help_text, parse_command,
};
use learnindeep::{API_KEY_ENV, Error, ErrorContext, GroqConnector, Model, Result};

/// Main entry point for the learnindeep-chat application.
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("learnindeep-chat [OPTIONS]");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ChatConfig::try_from(args)?.with_env_api_key();
    let connector = GroqConnector::with_options(config.base_url.clone(), None)?;
    let mut session = TutorSession::with_connector(connector);
    session.set_transcript_path(config.transcript_path.clone());
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    // Ctrl+C while a request is in flight: restore styling and leave.
    let use_color = config.use_color;
    ctrlc::set_handler(move || {
        if use_color {
            print!("\x1b[0m");
        }
        println!("\nInterrupted. Goodbye!");
        std::process::exit(130);
    })?;

    println!("Learning in Depth (model: {})", config.model);
    println!("Type /help for commands, /quit to exit\n");

    if let Some(topic) = config.topic.clone() {
        start_topic(&mut session, &config, &topic, &mut renderer).await;
    } else {
        renderer.print_info("Enter a topic with /start <topic> to begin!");
    }

    loop {
        let prompt = if session.is_started() { "You: " } else { "> " };
        let readline = rl.readline(prompt);

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if let Some(cmd) = parse_command(line) {
                    if !matches!(cmd, ChatCommand::Key(_)) {
                        let _ = rl.add_history_entry(line);
                    }
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Start(topic) => {
                            start_topic(&mut session, &config, &topic, &mut renderer).await;
                        }
                        ChatCommand::Level(level) => {
                            config.level = level;
                            renderer.print_info(&format!(
                                "Knowledge level set to {level} (applies to the next /start)."
                            ));
                        }
                        ChatCommand::Model(model_name) => {
                            config.model = Model::from(model_name.as_str());
                            renderer.print_info(&format!(
                                "Model set to {} (applies to the next /start).",
                                config.model
                            ));
                        }
                        ChatCommand::Temperature(value) => {
                            config.temperature = value;
                            renderer.print_info(&format!(
                                "Temperature set to {value:.1} (applies to the next /start)."
                            ));
                        }
                        ChatCommand::Key(key) => {
                            config.api_key = Some(key);
                            renderer.print_info("API key set.");
                        }
                        ChatCommand::Reset => {
                            session.reset();
                            renderer.print_info("Conversation cleared.");
                        }
                        ChatCommand::History => {
                            if session.visible_messages().is_empty() {
                                renderer.print_info("No conversation yet.");
                            } else {
                                renderer.print_transcript(session.messages());
                            }
                        }
                        ChatCommand::TranscriptPath(path) => {
                            session.set_transcript_path(Some(PathBuf::from(&path)));
                            renderer.print_info(&format!("Transcript auto-save set to {}", path));
                        }
                        ChatCommand::ClearTranscriptPath => {
                            session.set_transcript_path(None);
                            renderer.print_info("Transcript auto-save disabled.");
                        }
                        ChatCommand::SaveTranscript(path) => {
                            match session.save_transcript_to(&path) {
                                Ok(_) => {
                                    renderer.print_info(&format!("Transcript saved to {}", path))
                                }
                                Err(err) => renderer
                                    .print_error(&format!("Failed to save transcript: {}", err)),
                            }
                        }
                        ChatCommand::LoadTranscript(path) => {
                            match session.load_transcript_from(&path) {
                                Ok(_) => {
                                    renderer.print_info(&format!("Transcript loaded from {}", path))
                                }
                                Err(err) => renderer
                                    .print_error(&format!("Failed to load transcript: {}", err)),
                            }
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&config);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                let _ = rl.add_history_entry(line);
                if !session.is_started() {
                    renderer.print_info("Enter a topic with /start <topic> to begin!");
                    continue;
                }
                renderer.print_thinking_indicator();
                let result = session.send_turn(line).await;
                report(result, ErrorContext::Turn, &mut renderer);
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

async fn start_topic(
    session: &mut TutorSession,
    config: &ChatConfig,
    topic: &str,
    renderer: &mut PlainTextRenderer,
) {
    renderer.print_thinking_indicator();
    let result = session
        .start_topic(
            topic,
            config.level,
            config.credential(),
            config.model.clone(),
            config.temperature,
        )
        .await;
    if result.is_ok() {
        renderer.print_info(&format!("Learning: {} ({})", session.topic(), config.level));
    }
    report(result, ErrorContext::Start, renderer);
}

fn report(result: Result<TurnOutcome>, context: ErrorContext, renderer: &mut PlainTextRenderer) {
    match result {
        Ok(outcome) => {
            renderer.print_reply(&outcome.reply);
            if let Some(err) = outcome.save_error {
                renderer.print_error(&format!("Failed to auto-save transcript: {}", err));
            }
        }
        Err(err) => {
            renderer.print_error(&err.to_string());
            if let Some(hint) = err.credential_hint(context) {
                renderer.print_hint(&hint);
            } else if let Error::Validation { param: Some(param), .. } = &err
                && param == "credential"
            {
                renderer.print_hint(&format!(
                    "Use /key <api key> or set the {API_KEY_ENV} environment variable."
                ));
            }
        }
    }
}

fn print_stats(session: &TutorSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    if stats.started {
        println!("      Topic: {}", stats.topic);
    } else {
        println!("      Topic: (none)");
    }
    if let Some(level) = stats.level {
        println!("      Level: {}", level);
    }
    if let Some(model) = stats.model.as_ref() {
        println!("      Model: {}", model);
    }
    if let Some(temperature) = stats.temperature {
        println!("      Temperature: {:.1}", temperature);
    }
    println!("      Messages: {}", stats.message_count);
    println!(
        "      Total tokens: {} in / {} out ({} requests)",
        stats.total_usage.prompt_tokens, stats.total_usage.completion_tokens, stats.total_requests
    );
    if let Some(usage) = stats.last_turn_usage {
        println!(
            "      Last turn tokens: {} in / {} out",
            usage.prompt_tokens, usage.completion_tokens
        );
    }
    match stats.transcript_path {
        Some(ref path) => println!("      Transcript file: {}", path.display()),
        None => println!("      Transcript file: (disabled)"),
    }
}

fn print_config(config: &ChatConfig) {
    println!("    Current Configuration:");
    println!("      Model: {}", config.model);
    println!("      Level: {}", config.level);
    println!("      Temperature: {:.1}", config.temperature);
    println!(
        "      API key: {}",
        if config.api_key.is_some() {
            "set"
        } else {
            "(not set)"
        }
    );
    match config.base_url {
        Some(ref url) => println!("      Endpoint: {}", url),
        None => println!("      Endpoint: {}", learnindeep::DEFAULT_API_URL),
    }
}
