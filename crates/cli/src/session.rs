//! Line-oriented editing session over an image record store.
//!
//! Each input line is one user action, dispatched to the store the same way
//! a UI would wire its event handlers.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tagger_core::config::{AppConfig, IntakeConfig};
use tagger_core::{intake, ImageRecordStore, RecordId, SourceFile};
use tracing::warn;

use crate::render;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(Vec<PathBuf>),
    Remove(RecordId),
    Tag(RecordId, String),
    Untag(RecordId, String),
    List { json: bool },
    Help,
    Quit,
}

const HELP: &str = "commands:
  add <path>...          add images (files or directories)
  rm <id>                remove an image
  tag <id> <tag>         add a tag
  untag <id> <tag>       remove a tag
  ls [--json]            list images
  help | quit";

impl Command {
    /// Blank lines and `#` comments parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(v, r)| (v, r.trim()))
            .unwrap_or((line, ""));
        let cmd = match verb {
            "add" => {
                if rest.is_empty() {
                    return Err("add needs at least one path".to_string());
                }
                Command::Add(rest.split_whitespace().map(PathBuf::from).collect())
            }
            "rm" | "remove" => Command::Remove(parse_id(rest)?),
            "tag" | "untag" => {
                let (id, tag) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| format!("usage: {verb} <id> <tag>"))?;
                let id = parse_id(id)?;
                let tag = tag.trim().to_string();
                if verb == "tag" {
                    Command::Tag(id, tag)
                } else {
                    Command::Untag(id, tag)
                }
            }
            "ls" | "list" => Command::List {
                json: rest == "--json",
            },
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command: {other}")),
        };
        Ok(Some(cmd))
    }
}

fn parse_id(s: &str) -> Result<RecordId, String> {
    s.trim_start_matches('#')
        .parse()
        .map_err(|_| format!("not an image id: {s:?}"))
}

/// Expands paths and reads every file. Unreadable files are logged and skipped.
pub async fn read_files(paths: &[PathBuf], cfg: &IntakeConfig) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for path in intake::collect(paths, cfg)? {
        match intake::load(&path).await {
            Ok(file) => files.push(file),
            Err(e) => warn!(error = %e, "skipping file"),
        }
    }
    Ok(files)
}

pub async fn run<R: BufRead, W: Write>(
    store: &mut ImageRecordStore,
    cfg: &AppConfig,
    input: R,
    out: &mut W,
) -> Result<()> {
    for line in input.lines() {
        let cmd = match Command::parse(&line?) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(msg) => {
                writeln!(out, "error: {msg}")?;
                continue;
            }
        };
        match cmd {
            Command::Add(paths) => match read_files(&paths, &cfg.intake).await {
                Ok(files) => {
                    let report = store.add_batch(files).await;
                    render::write_report(out, &report)?;
                }
                Err(e) => writeln!(out, "error: {e:#}")?,
            },
            Command::Remove(id) => {
                if !store.remove(id) {
                    writeln!(out, "no image #{id}")?;
                }
            }
            Command::Tag(id, tag) => {
                if store.get(id).is_none() {
                    writeln!(out, "no image #{id}")?;
                } else {
                    store.add_tag(id, &tag);
                }
            }
            Command::Untag(id, tag) => {
                store.remove_tag(id, &tag);
            }
            Command::List { json } => {
                if json {
                    render::write_records_json(out, store.records())?;
                } else {
                    render::write_records(out, store.records())?;
                }
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => break,
        }
        out.flush()?;
    }
    Ok(())
}
