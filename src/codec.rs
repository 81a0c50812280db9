//! codec — wire-формат одной записи ValueCount.
//!
//! Формат (fixed LE, без заголовка и паддинга):
//!   [value_len u64][value bytes][count u64][first_time_seen i64][last_time_seen i64]
//!
//! Ширины закреплены явно (u64/i64 little-endian) — формат переносим между
//! платформами; legacy-файлы с нативными size_t/time_t ширинами не читаются.
//!
//! Семантика чтения:
//! - Ok(None) — чистый конец потока: нет ни одного байта там, где должен
//!   начинаться length (штатный терминатор «один файл — много записей»).
//! - Ok(Some(vc)) — запись прочитана целиком.
//! - Err — malformed record: любой короткий read после начала length
//!   (обрыв посреди записи не маскируется нулями, а отвергается).

use anyhow::{anyhow, Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{ErrorKind, Read, Write};

use crate::model::ValueCount;

/// Sanity-предел на value_len: битый length из повреждённого файла
/// не должен превращаться в гигантскую аллокацию.
pub const MAX_VALUE_LEN: u64 = 1 << 30;

/// Закодировать одну запись в поток.
pub fn write_value_count(w: &mut impl Write, vc: &ValueCount) -> Result<()> {
    w.write_u64::<LittleEndian>(vc.value.len() as u64)?;
    w.write_all(&vc.value)?;
    w.write_u64::<LittleEndian>(vc.count)?;
    w.write_i64::<LittleEndian>(vc.first_time_seen)?;
    w.write_i64::<LittleEndian>(vc.last_time_seen)?;
    Ok(())
}

/// Прочитать одну запись из потока.
pub fn read_value_count(r: &mut impl Read) -> Result<Option<ValueCount>> {
    // Поле length читаем вручную: EOF на первом байте — штатный конец потока,
    // EOF после хотя бы одного байта — обрыв записи.
    let len = match read_len_field(r)? {
        Some(v) => v,
        None => return Ok(None),
    };
    if len > MAX_VALUE_LEN {
        return Err(anyhow!(
            "malformed record: value length {} exceeds limit {}",
            len,
            MAX_VALUE_LEN
        ));
    }

    let mut value = vec![0u8; len as usize];
    r.read_exact(&mut value)
        .with_context(|| format!("malformed record: short read of value ({} bytes)", len))?;

    let count = r
        .read_u64::<LittleEndian>()
        .context("malformed record: short read of count")?;
    let first_time_seen = r
        .read_i64::<LittleEndian>()
        .context("malformed record: short read of first_time_seen")?;
    let last_time_seen = r
        .read_i64::<LittleEndian>()
        .context("malformed record: short read of last_time_seen")?;

    Ok(Some(ValueCount {
        value,
        count,
        first_time_seen,
        last_time_seen,
    }))
}

/// None — поток кончился ровно на границе записи.
fn read_len_field(r: &mut impl Read) -> Result<Option<u64>> {
    let mut buf = [0u8; 8];
    let mut got = 0usize;
    while got < 8 {
        match r.read(&mut buf[got..]) {
            Ok(0) => {
                if got == 0 {
                    return Ok(None);
                }
                return Err(anyhow!(
                    "malformed record: short read of value length ({} of 8 bytes)",
                    got
                ));
            }
            Ok(n) => got += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("read value length"),
        }
    }
    Ok(Some(u64::from_le_bytes(buf)))
}
