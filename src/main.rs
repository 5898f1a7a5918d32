//! Command-line front end over the reader library.
//!
//! - `lookup <word> [lang]` runs the dictionary cascade once.
//! - `books` lists stored books, most recently read first.
//! - `vocab <book-id>` prints a book's saved words, newest first.
//! - `delete <book-id>` removes a book and its vocabulary.

use anyhow::{Context, Result, anyhow};
use ebup_lexicon::config::{AppConfig, load_config};
use ebup_lexicon::library;
use ebup_lexicon::store::{BookId, FileStore};
use ebup_lexicon::translation::{LookupOutcome, MemoryCache, TranslationResolver};
use std::env;
use std::path::Path;
use std::rc::Rc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str =
    "Usage: ebup-lexicon lookup <word> [lang] | books | vocab <book-id> | delete <book-id>";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Lookup { word: String, language: Option<String> },
    Books,
    Vocab(BookId),
    Delete(BookId),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle).await {
        error!("{err:?}");
        std::process::exit(1);
    }
}

async fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let command = parse_args(env::args().skip(1))?;
    let config = load_config(Path::new("conf/config.toml"));
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(level = %config.log_level, data_dir = %config.data_dir, "Starting");

    match command {
        Command::Lookup { word, language } => lookup(&config, &word, language.as_deref()).await,
        Command::Books => {
            let store = FileStore::new(&config.data_dir);
            for book in library::list_books(&store).await? {
                println!(
                    "{:>4}  {:>3}%  {} ({})  {}",
                    book.id,
                    book.progress,
                    book.title,
                    book.author,
                    library::format_file_size(book.content.len() as u64)
                );
            }
            Ok(())
        }
        Command::Vocab(book_id) => {
            let store = FileStore::new(&config.data_dir);
            for word in library::vocabulary_for_book(&store, book_id).await? {
                println!(
                    "{}  {}: {}",
                    word.added_at.format("%Y-%m-%d"),
                    word.word,
                    word.translation
                );
            }
            Ok(())
        }
        Command::Delete(book_id) => {
            let store = FileStore::new(&config.data_dir);
            let removed = library::delete_book(&store, book_id).await?;
            println!("Deleted book {book_id} and {removed} saved words");
            Ok(())
        }
    }
}

async fn lookup(config: &AppConfig, word: &str, language: Option<&str>) -> Result<()> {
    let resolver = TranslationResolver::from_config(config, Rc::new(MemoryCache::new()))
        .context("Failed to build HTTP client")?;
    let language = language.unwrap_or(resolver.target_language()).to_string();
    match resolver.translate_to(word, &language).await {
        LookupOutcome::Found(translation) => {
            let mut header = translation.word.clone();
            if let Some(phonetic) = &translation.phonetic {
                header.push_str(&format!(" {phonetic}"));
            }
            if let Some(pos) = &translation.part_of_speech {
                header.push_str(&format!(" ({pos})"));
            }
            println!("{header}\n  {}", translation.translation);
        }
        LookupOutcome::NotFound => println!("No translation found for {word}"),
    }
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let verb = args.next().ok_or_else(|| anyhow!(USAGE))?;
    let command = match verb.as_str() {
        "lookup" => Command::Lookup {
            word: args.next().ok_or_else(|| anyhow!(USAGE))?,
            language: args.next(),
        },
        "books" => Command::Books,
        "vocab" => Command::Vocab(parse_book_id(args.next())?),
        "delete" => Command::Delete(parse_book_id(args.next())?),
        other => return Err(anyhow!("Unknown command {other}. {USAGE}")),
    };
    Ok(command)
}

fn parse_book_id(raw: Option<String>) -> Result<BookId> {
    let raw = raw.ok_or_else(|| anyhow!(USAGE))?;
    raw.parse()
        .with_context(|| format!("Invalid book id: {raw}"))
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if env::var_os("RUST_LOG").is_some() {
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    }
}
