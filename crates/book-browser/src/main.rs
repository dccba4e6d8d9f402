//! Book browser CLI application.

use anyhow::{Context, Result};
use book_browser::{display, BookBrowser, BrowserOptions, IceAndFireClient, ReferenceMap};
use clap::Parser;
use shared::Config;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Listing page to fetch on startup (1-based)
    #[arg(short, long, default_value_t = 1)]
    page: u32,

    /// Override the configured number of books per listing page
    #[arg(long)]
    page_size: Option<u32>,

    /// Print the settled page as JSON and exit
    #[arg(long)]
    json: bool,

    /// Render once and exit instead of entering the command loop
    #[arg(long)]
    no_input: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = shared::LogConfig::from_settings("book-browser", &config.logging);
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    // Keep stdout clean when the page is printed as JSON.
    log_config.console = log_config.console && !args.json;
    shared::logging::init(log_config)?;

    info!("Book browser starting");
    info!(config_file = %args.config.display(), "Loaded configuration");

    // Initialize API client
    let client = IceAndFireClient::new(
        config.api.base_url.clone(),
        Duration::from_secs(config.api.timeout_seconds),
        &config.api.user_agent,
    )
    .context("Failed to create API client")?;

    let browser = BookBrowser::new(
        client,
        ReferenceMap::new(),
        BrowserOptions::from(&config.browser),
    );

    // Fetch the initial page
    let page_size = args.page_size.unwrap_or(config.browser.book_page_size);
    browser
        .fetch_books_with_page_size(args.page, page_size)
        .await
        .context("Error occurred when fetching books")?;
    browser.wait_for_background_tasks().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&browser.books())?);
        return Ok(());
    }

    render(&browser);

    if args.no_input {
        return Ok(());
    }

    command_loop(&browser).await
}

/// Print the displayed page: header, books, and each book's roster
fn render(browser: &BookBrowser) {
    println!();
    println!(
        "{}",
        display::page_header(browser.page_number(), browser.page_numbers())
    );
    println!();

    let books = browser.books();
    if books.is_empty() {
        println!("No books on this page.");
        return;
    }

    for (index, book) in books.iter().enumerate() {
        println!(
            "{}",
            display::book_summary(index + 1, book, browser.character_page_size())
        );
        for character in &book.characters {
            println!("{}", display::character_line(character, browser.references()));
        }
        println!();
    }
}

fn print_help() {
    println!("Commands:");
    println!("  page <n>    switch to listing page n");
    println!("  more <i>    load the next characters of book i on this page");
    println!("  titles      list every book title fetched so far");
    println!("  help        show this help");
    println!("  quit        exit");
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

/// Interactive command loop reading one command per line from stdin
async fn command_loop(browser: &BookBrowser) -> Result<()> {
    print_help();
    prompt();

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("page") => match parts.next().and_then(|n| n.parse::<u32>().ok()) {
                Some(page) => {
                    match browser.fetch_books(page).await {
                        Ok(()) => {
                            browser.wait_for_background_tasks().await;
                            render(browser);
                        }
                        Err(error) => {
                            // The page on screen is untouched; tell the user and move on.
                            eprintln!("Error occurred when fetching books: {error}");
                        }
                    }
                }
                None => println!("Usage: page <n>"),
            },
            Some("more") => match parts.next().and_then(|i| i.parse::<usize>().ok()) {
                Some(index) => {
                    let books = browser.books();
                    match index.checked_sub(1).and_then(|i| books.get(i)) {
                        Some(book) => {
                            let url = book.url.clone();
                            match browser.fetch_characters(&url).await {
                                Ok(0) => println!("No more characters to load."),
                                Ok(_) => {
                                    browser.wait_for_background_tasks().await;
                                    render(browser);
                                }
                                Err(error) => {
                                    warn!(book = %url, error = %error, "Character load failed");
                                }
                            }
                        }
                        None => println!("No book {index} on this page."),
                    }
                }
                None => println!("Usage: more <i>"),
            },
            Some("titles") => println!("{}", display::known_titles(browser.references())),
            Some("help") => print_help(),
            Some("quit") | Some("exit") => break,
            Some(other) => println!("Unknown command: {other} (try 'help')"),
            None => {}
        }
        prompt();
    }

    info!("Book browser exiting");
    Ok(())
}
