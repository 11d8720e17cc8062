use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chatlog_contracts::chat::{
    annotate_item, load_histories, transform_preview_histories, write_histories, ChatHistoryItem,
};
use chatlog_contracts::events::EventLog;
use chatlog_contracts::icon::{IconTable, DEFAULT_FILE_ICON};
use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "chatlog-rs", version, about = "Chat history annotation tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the icon tag for each filename.
    Icon(IconArgs),
    /// Attach trace statistics to AI history items.
    Annotate(AnnotateArgs),
    /// Annotate and strip trace data for preview consumers.
    Preview(PreviewArgs),
}

#[derive(Debug, Parser)]
struct IconArgs {
    #[arg(required = true)]
    filenames: Vec<String>,
    #[arg(long, default_value = DEFAULT_FILE_ICON)]
    default_icon: String,
    #[arg(long)]
    icon_overrides: Option<PathBuf>,
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct AnnotateArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct PreviewArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    response_detail: bool,
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    events: Option<PathBuf>,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("chatlog-rs error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Icon(args) => run_icon(args),
        Command::Annotate(args) => run_annotate(args),
        Command::Preview(args) => run_preview(args),
    }
}

fn run_icon(args: IconArgs) -> Result<i32> {
    let table = load_icon_table(args.icon_overrides.as_deref())?;
    let events = args.events.map(open_event_log);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for filename in &args.filenames {
        let tag = table.resolve(filename, &args.default_icon);
        writeln!(out, "{filename}\t{tag}")?;
        if let Some(events) = &events {
            events.record_icon(filename, tag)?;
        }
    }
    Ok(0)
}

fn run_annotate(args: AnnotateArgs) -> Result<i32> {
    let histories = load_histories(&args.input)?;
    let annotated: Vec<ChatHistoryItem> = histories
        .iter()
        .map(|item| annotate_item(item).into_owned())
        .collect();

    emit_history_event(args.events, &args.input, "annotate", &annotated)?;
    write_output(args.out.as_deref(), &annotated)?;
    Ok(0)
}

fn run_preview(args: PreviewArgs) -> Result<i32> {
    let histories = load_histories(&args.input)?;
    let preview = transform_preview_histories(histories, args.response_detail);

    emit_history_event(args.events, &args.input, "preview", &preview)?;
    write_output(args.out.as_deref(), &preview)?;
    Ok(0)
}

fn load_icon_table(explicit: Option<&Path>) -> Result<IconTable> {
    let table = IconTable::default();
    if let Some(path) = explicit {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read icon overrides {}", path.display()))?;
        return Ok(table.with_overrides(&raw));
    }
    match icon_override_path().map(fs::read_to_string) {
        Some(Ok(raw)) => Ok(table.with_overrides(&raw)),
        _ => Ok(table),
    }
}

fn icon_override_path() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(".chatlog").join("icon_overrides.json"))
}

fn open_event_log(path: PathBuf) -> EventLog {
    EventLog::new(path, Uuid::new_v4().to_string())
}

fn emit_history_event(
    events_path: Option<PathBuf>,
    input: &Path,
    mode: &str,
    histories: &[ChatHistoryItem],
) -> Result<()> {
    if let Some(events_path) = events_path {
        open_event_log(events_path).record_histories(input, mode, histories)?;
    }
    Ok(())
}

fn write_output(out: Option<&Path>, histories: &[ChatHistoryItem]) -> Result<()> {
    if let Some(path) = out {
        write_histories(path, histories)?;
        eprintln!("Wrote {} history items to {}", histories.len(), path.display());
        return Ok(());
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, histories)?;
    writeln!(handle)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use serde_json::Value;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn preview_flags_parse() {
        let cli = Cli::parse_from([
            "chatlog-rs",
            "preview",
            "--input",
            "history.json",
            "--response-detail",
        ]);
        match cli.command {
            Command::Preview(args) => {
                assert!(args.response_detail);
                assert_eq!(args.input, PathBuf::from("history.json"));
                assert!(args.out.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn explicit_icon_overrides_are_applied() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("icons.json");
        fs::write(&path, r#"{"png": "image"}"#)?;

        let table = load_icon_table(Some(&path))?;
        assert_eq!(table.resolve("cat.PNG", DEFAULT_FILE_ICON), "image");
        assert_eq!(table.resolve("doc.pdf", DEFAULT_FILE_ICON), "file/fill/pdf");
        Ok(())
    }

    #[test]
    fn missing_explicit_overrides_fail() {
        let missing = PathBuf::from("/nonexistent/chatlog/icons.json");
        assert!(load_icon_table(Some(&missing)).is_err());
    }

    #[test]
    fn preview_writes_output_and_event() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let input = temp.path().join("history.json");
        let out = temp.path().join("out").join("preview.json");
        let events = temp.path().join("events.jsonl");
        fs::write(
            &input,
            r#"[{"obj": "AI", "value": [], "responseData": [
                {"moduleType": "datasetSearchNode", "runningTime": 0.5, "quoteList": [{"id": "q"}]}
            ]}]"#,
        )?;

        run_preview(PreviewArgs {
            input: input.clone(),
            response_detail: false,
            out: Some(out.clone()),
            events: Some(events.clone()),
        })?;

        let written = load_histories(&out)?;
        assert_eq!(written.len(), 1);
        assert!(written[0].response_data.is_none());
        assert!(written[0].total_quote_list.is_none());
        assert_eq!(written[0].total_running_time, Some(0.5));

        let line = fs::read_to_string(&events)?;
        let event: Value = serde_json::from_str(line.trim())?;
        assert_eq!(event["type"], Value::String("history_annotated".to_string()));
        assert_eq!(event["mode"], Value::String("preview".to_string()));
        Ok(())
    }
}
