//! Command-line front end for pocketnote.
//!
//! # Responsibility
//! - Map subcommands onto `EditorSession`/`NoteStore` operations.
//! - Resolve data/log directories and optional `config.json`.
//! - Confirm destructive actions before calling into core.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, TimeZone};
use pocketnote_core::{
    default_log_level, export_file_name, init_logging, Clock, EditorSession, NoteStore,
    SqliteBlobStorage, StoreConfig, SystemClock,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const DATA_DIR_ENV: &str = "POCKETNOTE_DATA_DIR";
const LOG_LEVEL_ENV: &str = "POCKETNOTE_LOG_LEVEL";
const DB_FILE_NAME: &str = "notes.sqlite3";
const CONFIG_FILE_NAME: &str = "config.json";

const USAGE: &str = "usage: pocketnote <command> [args]

commands:
  list [filter...]                      list notes, newest first
  new                                   create an empty note and print its id
  show <id>                             print one note
  save <id> [--title T] [--body B]      replace title and/or body
  edit <id> [--title T] [--no-autosave] append stdin lines to the body with autosave
  delete <id> [--yes]                   delete a note after confirmation
  export [path]                         write all notes as pretty JSON
  import <path>                         merge notes from a JSON export
  version                               print the version";

type Session = EditorSession<SqliteBlobStorage, SystemClock>;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run(&args) {
        log::error!("event=cli_exit module=cli status=error error={err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let Some((command, rest)) = args.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    match command.as_str() {
        "help" | "--help" | "-h" => {
            println!("{USAGE}");
            Ok(())
        }
        "version" | "--version" => {
            println!("pocketnote {}", pocketnote_core::core_version());
            Ok(())
        }
        other => {
            let data_dir = resolve_data_dir()?;
            start_logging(&data_dir);
            let config = load_config(&data_dir)?;
            let mut session = open_session(&data_dir, &config)?;
            let outcome = dispatch(&mut session, other, rest);
            session.close().context("failed to flush pending edits")?;
            outcome
        }
    }
}

fn dispatch(session: &mut Session, command: &str, args: &[String]) -> Result<()> {
    match command {
        "list" => cmd_list(session, &args.join(" ")),
        "new" => {
            let id = session.new_note()?;
            println!("{id}");
            Ok(())
        }
        "show" => cmd_show(session, required(args, 0, "id")?),
        "save" => cmd_save(session, args),
        "edit" => cmd_edit(session, args),
        "delete" => cmd_delete(session, args),
        "export" => cmd_export(session, args.first().map(String::as_str)),
        "import" => cmd_import(session, required(args, 0, "path")?),
        other => bail!("unknown command `{other}`\n\n{USAGE}"),
    }
}

fn cmd_list(session: &Session, filter: &str) -> Result<()> {
    let rows = session.store().list_summaries(filter);
    if rows.is_empty() {
        println!("no notes");
        return Ok(());
    }
    for row in rows {
        let marker = if session.selection() == Some(row.id.as_str()) {
            '*'
        } else {
            ' '
        };
        println!(
            "{marker} {}  {}  {}",
            row.id,
            format_timestamp(row.updated_at),
            row.display_title
        );
        if !row.preview.is_empty() {
            println!("    {}", row.preview);
        }
    }
    Ok(())
}

fn cmd_show(session: &mut Session, id: &str) -> Result<()> {
    let note = session
        .select(id)?
        .ok_or_else(|| anyhow!("note `{id}` not found"))?;
    println!("id:      {}", note.id);
    println!("title:   {}", note.title);
    println!("created: {}", format_timestamp(note.created_at));
    println!("updated: {}", format_timestamp(note.updated_at));
    println!();
    println!("{}", note.body);
    Ok(())
}

fn cmd_save(session: &mut Session, args: &[String]) -> Result<()> {
    let id = required(args, 0, "id")?;
    let title = flag_value(args, "--title")?;
    let body = flag_value(args, "--body")?;
    let current = session
        .select(id)?
        .cloned()
        .ok_or_else(|| anyhow!("note `{id}` not found"))?;

    session.edit(
        title.unwrap_or(current.title),
        body.unwrap_or(current.body),
    );
    let saved = session
        .save_now()?
        .ok_or_else(|| anyhow!("note `{id}` disappeared before saving"))?;
    println!("saved {} at {}", saved.id, format_timestamp(saved.updated_at));
    Ok(())
}

fn cmd_edit(session: &mut Session, args: &[String]) -> Result<()> {
    let id = required(args, 0, "id")?;
    let current = session
        .select(id)?
        .cloned()
        .ok_or_else(|| anyhow!("note `{id}` not found"))?;
    let title = flag_value(args, "--title")?.unwrap_or(current.title);
    let mut body = current.body;
    if args.iter().any(|arg| arg == "--no-autosave") {
        session.set_autosave_enabled(false);
    }

    eprintln!("appending to `{id}`; end input with Ctrl-D");
    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(&line);
        session.edit(title.clone(), body.clone());
        if session.tick()? {
            eprintln!("autosaved");
        }
    }
    Ok(())
}

fn cmd_delete(session: &mut Session, args: &[String]) -> Result<()> {
    let id = required(args, 0, "id")?;
    if session.select(id)?.is_none() {
        bail!("note `{id}` not found");
    }
    let confirmed = args.iter().any(|arg| arg == "--yes") || confirm("Delete this note?")?;
    if !confirmed {
        println!("cancelled");
        return Ok(());
    }
    session.delete_selected()?;
    println!("deleted {id}");
    Ok(())
}

fn cmd_export(session: &Session, path: Option<&str>) -> Result<()> {
    let data = session.store().export_all()?;
    let path = path
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(export_file_name(SystemClock.now_ms())));
    std::fs::write(&path, data)
        .with_context(|| format!("failed to write export `{}`", path.display()))?;
    println!(
        "exported {} note(s) to {}",
        session.store().len(),
        path.display()
    );
    Ok(())
}

fn cmd_import(session: &mut Session, path: &str) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read import file `{path}`"))?;
    let added = session
        .import_merge(&raw)
        .context("failed to import")?;
    println!("imported {added} note(s)");
    Ok(())
}

fn open_session(data_dir: &Path, config: &StoreConfig) -> Result<Session> {
    let storage = SqliteBlobStorage::open(data_dir.join(DB_FILE_NAME))
        .context("failed to open note storage")?
        .with_quota(config.max_blob_bytes);
    let store = NoteStore::open(storage, SystemClock, config.storage_key.clone());
    Ok(EditorSession::open(store, &config.autosave))
}

fn resolve_data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => dirs::data_dir()
            .ok_or_else(|| anyhow!("no platform data directory; set {DATA_DIR_ENV}"))?
            .join("pocketnote"),
    };
    if dir.is_absolute() {
        return Ok(dir);
    }
    Ok(std::env::current_dir()
        .context("failed to resolve current directory")?
        .join(dir))
}

fn start_logging(data_dir: &Path) {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().to_string());
    let log_dir = data_dir.join("logs");
    // Logging is best-effort for the CLI; note operations still run without it.
    if let Err(err) = init_logging(&level, &log_dir.to_string_lossy()) {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn load_config(data_dir: &Path) -> Result<StoreConfig> {
    let path = data_dir.join(CONFIG_FILE_NAME);
    match std::fs::read_to_string(&path) {
        Ok(raw) => StoreConfig::from_json_str(&raw)
            .with_context(|| format!("failed to load `{}`", path.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(StoreConfig::default()),
        Err(err) => Err(err).with_context(|| format!("failed to read `{}`", path.display())),
    }
}

fn required<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .filter(|value| !value.starts_with("--"))
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing <{name}> argument\n\n{USAGE}"))
}

fn flag_value(args: &[String], flag: &str) -> Result<Option<String>> {
    match args.iter().position(|arg| arg == flag) {
        None => Ok(None),
        Some(index) => args
            .get(index + 1)
            .cloned()
            .map(Some)
            .ok_or_else(|| anyhow!("{flag} expects a value")),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush().context("failed to flush stdout")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn format_timestamp(epoch_ms: i64) -> String {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}
