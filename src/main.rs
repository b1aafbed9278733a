//! NewsLens - Regional News Analysis Explorer
//!
//! A CLI that sends a (topic, region) pair to an external analysis
//! service and lets the user refine the result through conversational
//! follow-up questions.
//!
//! Exit codes:
//!   0 - Clean exit
//!   1 - Runtime error (connection setup, config failure, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod regions;
mod retrieval;
mod session;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use models::{Message, Phase, Role};
use retrieval::AnalysisServiceClient;
use session::SessionController;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("NewsLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_session(args).await {
        error!("Session failed: {}", e);
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .newslens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".newslens.toml");

    if path.exists() {
        eprintln!("⚠️  .newslens.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .newslens.toml")?;

    println!("✅ Created .newslens.toml with default settings.");
    println!("   Edit it to customize the service URL and suggestion rules.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .newslens.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Run the interactive session loop until the user quits.
async fn run_session(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let client = AnalysisServiceClient::new(
        config.service.base_url.clone(),
        Duration::from_secs(config.service.timeout_seconds),
    )
    .context("Failed to build the service client")?;

    let (mut controller, mut events) =
        SessionController::new(Arc::new(client), config.suggestions.clone());

    println!("🗞️  NewsLens");
    println!("   Service: {}", config.service.base_url);
    println!("   Type a topic to begin, /help for commands.\n");

    if let Some(ref topic) = args.topic {
        controller.enter_topic(topic);
    }
    if let Some(ref region) = args.region {
        controller.select_region(region);
    }

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut spinner: Option<ProgressBar> = None;
    let mut printed_stamp: u64 = 0;
    let max_shown = config.general.max_shown_articles;

    sync_spinner(&mut spinner, controller.session().phase);
    print_hint(controller.session().phase, &spinner);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break; // EOF
                };
                if !handle_line(&mut controller, line.trim()) {
                    break;
                }
            }
            Some(event) = events.recv() => {
                let before = controller.session().phase;
                controller.apply(event);
                render_after_event(&controller, before, &mut printed_stamp, max_shown);
            }
        }

        sync_spinner(&mut spinner, controller.session().phase);
        print_hint(controller.session().phase, &spinner);
    }

    println!("Goodbye!");
    Ok(())
}

/// Dispatch one input line. Returns false when the user quits.
fn handle_line(controller: &mut SessionController, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }

    if let Some(rest) = line.strip_prefix('/') {
        let mut parts = rest.splitn(2, ' ');
        let command = parts.next().unwrap_or("");
        let argument = parts.next().unwrap_or("").trim();

        match command {
            "help" | "h" => print_help(),
            "quit" | "q" | "exit" => return false,
            "topic" | "t" => controller.enter_topic(argument),
            "region" | "r" => controller.select_region(argument),
            "back" | "b" => controller.close_detail(),
            "dismiss" | "d" => controller.dismiss_error(),
            "where" | "w" => {
                let center = regions::lookup(argument);
                println!(
                    "   {} centers at {:.4}, {:.4}",
                    if argument.is_empty() { "(default)" } else { argument },
                    center.longitude,
                    center.latitude
                );
            }
            other => {
                println!("? Unknown command: /{}", other);
                println!("  Type /help for available commands");
            }
        }
        return true;
    }

    // Plain input is interpreted by phase.
    match controller.session().phase {
        Phase::Idle => controller.enter_topic(line),
        // Picking again while loading supersedes the in-flight request.
        Phase::TopicEntered | Phase::Loading => controller.select_region(line),
        Phase::Detail => {
            // A bare number picks one of the suggested questions.
            if let Ok(choice) = line.parse::<usize>() {
                let suggested: Vec<String> = controller
                    .conversation()
                    .map(|c| c.suggested_questions().to_vec())
                    .unwrap_or_default();
                if choice >= 1 && choice <= suggested.len() {
                    let question = &suggested[choice - 1];
                    println!("> {}", question);
                    controller.submit_question(question);
                    return true;
                }
            }
            controller.submit_question(line);
        }
        Phase::Error => println!("  Dismiss the error first with /dismiss."),
    }

    true
}

/// Print whatever a just-applied event made visible.
fn render_after_event(
    controller: &SessionController,
    before: Phase,
    printed_stamp: &mut u64,
    max_shown: usize,
) {
    let phase = controller.session().phase;

    if phase == Phase::Error && before != Phase::Error {
        if let Some(message) = &controller.session().error_message {
            println!("\n⛔ {}", message);
            println!("   Type /dismiss to go back and pick another region.");
        }
        return;
    }

    if phase == Phase::Detail && before != Phase::Detail {
        *printed_stamp = 0;
        print_detail(controller, max_shown);
    }

    // Print any assistant messages appended since the last render; user
    // messages are the user's own words and are never echoed back.
    if let Some(conversation) = controller.conversation() {
        for message in conversation.log() {
            if message.stamp > *printed_stamp && message.role == Role::Assistant {
                print_answer(message, max_shown);
            }
        }
        *printed_stamp = conversation.last_stamp();
    }
}

/// Print the detail view for a fresh analysis result.
fn print_detail(controller: &SessionController, max_shown: usize) {
    let session = controller.session();
    let (Some(result), Some(conversation)) = (controller.result(), controller.conversation())
    else {
        return;
    };
    let region = session.selected_region.as_deref().unwrap_or("?");
    let center = regions::lookup(region);
    let score = conversation.sentiment_score();

    println!();
    println!("📍 {} — {}", region, session.topic);
    println!(
        "   Map center: {:.4}, {:.4}",
        center.longitude, center.latitude
    );
    println!(
        "   Public opinion: {} ({})",
        analysis::label(score),
        analysis::percent(score)
    );
    println!("   Sources: {}", result.articles.len());

    for article in result.articles.iter().take(max_shown) {
        println!();
        println!("   📰 {} — {}", article.headline, article.source_domain);
        println!("      {}", article.summary);
        if let Some(background) = &article.source_background {
            println!("      About the source: {}", background);
        }
        println!("      [{}] {}", article.sentiment, article.url);
    }
    if result.articles.len() > max_shown {
        println!("   … and {} more", result.articles.len() - max_shown);
    }

    if !conversation.suggested_questions().is_empty() {
        println!();
        println!("   Suggested questions (type a number to ask):");
        for (i, question) in conversation.suggested_questions().iter().enumerate() {
            println!("     {}. {}", i + 1, question);
        }
    }
}

/// Print one assistant message, with its attached articles if any.
fn print_answer(message: &Message, max_shown: usize) {
    println!("\n💬 {}", message.content);
    if let Some(result) = &message.attached {
        for article in result.articles.iter().take(max_shown) {
            println!("   📰 {} — {}", article.headline, article.source_domain);
            println!("      {}", article.summary);
        }
        if result.articles.len() > max_shown {
            println!("   … and {} more", result.articles.len() - max_shown);
        }
    }
}

/// Print help message
fn print_help() {
    println!();
    println!("Commands:");
    println!("  {:16} Set a new topic (clears the current analysis)", "/topic <text>");
    println!("  {:16} Analyze the topic for a region", "/region <name>");
    println!("  {:16} Close the detail view", "/back");
    println!("  {:16} Dismiss the error banner", "/dismiss");
    println!("  {:16} Show a region's map center", "/where <name>");
    println!("  {:16} Show this help", "/help");
    println!("  {:16} Exit", "/quit");
    println!();
    println!("Plain input is a topic before a region is picked, a region");
    println!("name after, and a follow-up question inside the detail view.");
    println!();
}

/// Print the prompt hint for the current phase.
fn print_hint(phase: Phase, spinner: &Option<ProgressBar>) {
    if spinner.is_some() {
        return;
    }
    let hint = match phase {
        Phase::Idle => "topic> ",
        Phase::TopicEntered => "region> ",
        Phase::Loading => return,
        Phase::Detail => "ask> ",
        Phase::Error => "error> ",
    };
    print!("{}", hint);
    let _ = std::io::stdout().flush();
}

/// Keep the loading spinner in step with the session phase.
fn sync_spinner(spinner: &mut Option<ProgressBar>, phase: Phase) {
    if phase == Phase::Loading {
        if spinner.is_none() {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap(),
            );
            pb.set_message("Analyzing coverage...");
            pb.enable_steady_tick(Duration::from_millis(120));
            *spinner = Some(pb);
        }
    } else if let Some(pb) = spinner.take() {
        pb.finish_and_clear();
    }
}
