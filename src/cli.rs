//! cli — командная оболочка над библиотекой.
//!
//! Команды:
//! - inspect: загрузить снапшот и распечатать содержимое (текст или JSON);
//! - diff: направленная разница newer-минус-older, опционально с записью
//!   результата как снапшота под --out;
//! - import: построить снапшот из JSON-документа и записать его на диск.
//!
//! JSON-граница требует UTF-8 значений; бинарный формат на диске — нет.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::diff::diff_snapshots;
use crate::model::{Item, Snapshot, ValueCount};
use crate::store::{read_snapshot, write_snapshot};

#[derive(Parser, Debug)]
#[command(
    name = "snapdiff",
    version,
    about = "Directory-backed observation snapshots and directed diffing",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Показать содержимое снапшота.
    Inspect {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Всё, что есть в newer и отсутствует в older.
    Diff {
        #[arg(long)]
        older: PathBuf,
        #[arg(long)]
        newer: PathBuf,
        /// Базовый каталог: результат сохраняется как <out>/<имя-результата>.
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Построить снапшот из JSON-файла и записать на диск.
    Import {
        #[arg(long)]
        file: PathBuf,
        /// Базовый каталог (по умолчанию — текущий).
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Inspect { path, json } => cmd_inspect(path, json),
        Cmd::Diff {
            older,
            newer,
            out,
            json,
        } => cmd_diff(older, newer, out, json),
        Cmd::Import { file, out } => cmd_import(file, out),
    }
}

fn cmd_inspect(path: PathBuf, json: bool) -> Result<()> {
    let snapshot = read_snapshot(&path)?;
    if json {
        println!("{}", snapshot_to_json(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn cmd_diff(older: PathBuf, newer: PathBuf, out: Option<PathBuf>, json: bool) -> Result<()> {
    let result = diff_snapshots(&older, &newer)?;
    if json {
        println!("{}", snapshot_to_json(&result)?);
    } else {
        print_snapshot(&result);
    }
    if let Some(base) = out {
        let dir = write_snapshot(&result, Some(base.as_path()))?;
        println!("Wrote diff snapshot to {}", dir.display());
    }
    Ok(())
}

fn cmd_import(file: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let text = fs::read_to_string(&file)
        .with_context(|| format!("read json file {}", file.display()))?;
    let snapshot = snapshot_from_json(&text)
        .with_context(|| format!("parse json file {}", file.display()))?;
    let dir = write_snapshot(&snapshot, out.as_deref())?;
    println!(
        "Imported snapshot '{}' ({} item(s)) to {}",
        snapshot.name,
        snapshot.len(),
        dir.display()
    );
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("Snapshot '{}' ({} item(s))", snapshot.name, snapshot.len());
    for item in &snapshot.items {
        println!("  {} ({} value(s))", item.key, item.len());
        for vc in &item.values {
            println!(
                "    {} count={} first_seen={} last_seen={}",
                vc.value_lossy(),
                vc.count,
                vc.first_time_seen,
                vc.last_time_seen
            );
        }
    }
}

// ---------------------- JSON-представление ----------------------

#[derive(Serialize, Deserialize)]
struct JsonSnapshot {
    name: String,
    items: Vec<JsonItem>,
}

#[derive(Serialize, Deserialize)]
struct JsonItem {
    key: String,
    values: Vec<JsonValueCount>,
}

#[derive(Serialize, Deserialize)]
struct JsonValueCount {
    value: String,
    count: u64,
    first_time_seen: i64,
    last_time_seen: i64,
}

pub fn snapshot_to_json(snapshot: &Snapshot) -> Result<String> {
    let mut items = Vec::with_capacity(snapshot.len());
    for item in &snapshot.items {
        let mut values = Vec::with_capacity(item.len());
        for vc in &item.values {
            let value = std::str::from_utf8(&vc.value)
                .with_context(|| {
                    format!("item '{}': value is not UTF-8, cannot export as JSON", item.key)
                })?
                .to_owned();
            values.push(JsonValueCount {
                value,
                count: vc.count,
                first_time_seen: vc.first_time_seen,
                last_time_seen: vc.last_time_seen,
            });
        }
        items.push(JsonItem {
            key: item.key.clone(),
            values,
        });
    }
    let doc = JsonSnapshot {
        name: snapshot.name.clone(),
        items,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn snapshot_from_json(text: &str) -> Result<Snapshot> {
    let doc: JsonSnapshot = serde_json::from_str(text).context("parse snapshot json")?;
    let mut snapshot = Snapshot::with_name(doc.name);
    for jitem in doc.items {
        let mut item = Item::new(&jitem.key);
        for jvc in jitem.values {
            item.push(ValueCount::new(
                jvc.value.into_bytes(),
                jvc.count,
                jvc.first_time_seen,
                jvc.last_time_seen,
            ));
        }
        snapshot.insert(item)?;
    }
    Ok(snapshot)
}
