//! store — персистенция снапшота как каталога.
//!
//! Раскладка: один каталог на снапшот (имя каталога = имя снапшота,
//! права 0700), один файл на Item (имя файла = ключ). Снапшоты write-once:
//! write отказывает, если целевой каталог уже существует.
//!
//! read пропускает записи, начинающиеся с '.' (включая '.', '..' и
//! dot-файлы) и сортирует имена перед декодированием — порядок Item'ов
//! после загрузки детерминирован.

use anyhow::{Context, Result};
use log::{debug, info};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::item::{read_item, write_item};
use crate::model::Snapshot;

/// Загрузить снапшот из каталога целиком.
///
/// Ошибка одного файла прерывает всю загрузку: снапшот — единица
/// консистентности, частично прочитанный меняет результат diff'а молча.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let entries = fs::read_dir(path)
        .with_context(|| format!("read snapshot dir {}", path.display()))?;

    let mut names: Vec<String> = Vec::new();
    for ent in entries {
        let ent = ent.with_context(|| format!("enumerate snapshot dir {}", path.display()))?;
        let name = ent.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            debug!("read_snapshot: skip dot entry '{}'", name);
            continue;
        }
        names.push(name);
    }
    names.sort();

    let mut snapshot = Snapshot::open(path);
    for name in names {
        let file_path = path.join(&name);
        let f = File::open(&file_path)
            .with_context(|| format!("read item file {}", file_path.display()))?;
        let mut r = BufReader::new(f);
        let item = read_item(&name, &mut r)
            .with_context(|| format!("read item file {}", file_path.display()))?;
        debug!(
            "read_snapshot: item '{}' with {} value(s)",
            item.key,
            item.len()
        );
        snapshot.insert(item)?;
    }

    info!(
        "read_snapshot: '{}' loaded from {} ({} item(s))",
        snapshot.name,
        path.display(),
        snapshot.len()
    );
    Ok(snapshot)
}

/// Записать снапшот в каталог `base/name` (или `name` без base).
/// Каталог создаётся с mode 0700; существующий — ошибка.
/// Возвращает путь созданного каталога.
pub fn write_snapshot(snapshot: &Snapshot, base: Option<&Path>) -> Result<PathBuf> {
    let dir = match base {
        Some(b) => b.join(&snapshot.name),
        None => PathBuf::from(&snapshot.name),
    };

    create_snapshot_dir(&dir)
        .with_context(|| format!("create snapshot dir {}", dir.display()))?;

    for item in &snapshot.items {
        let file_path = dir.join(&item.key);
        let f = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&file_path)
            .with_context(|| format!("write item file {}", file_path.display()))?;
        let mut w = BufWriter::new(f);
        write_item(item, &mut w)
            .with_context(|| format!("write item file {}", file_path.display()))?;
        w.flush()
            .with_context(|| format!("write item file {}", file_path.display()))?;
        debug!(
            "write_snapshot: item '{}' with {} value(s)",
            item.key,
            item.len()
        );
    }

    info!(
        "write_snapshot: '{}' written to {} ({} item(s))",
        snapshot.name,
        dir.display(),
        snapshot.len()
    );
    Ok(dir)
}

#[cfg(unix)]
fn create_snapshot_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_snapshot_dir(dir: &Path) -> std::io::Result<()> {
    fs::DirBuilder::new().create(dir)
}
