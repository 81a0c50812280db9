//! item — чтение/запись одного Item как файла.
//!
//! Файл = конкатенация записей codec'а, без заголовка и счётчика;
//! конец файла — единственный терминатор. Ключ Item'а в файле не хранится,
//! его поставляет вызывающий (имя файла).

use anyhow::{Context, Result};
use std::io::{Read, Write};

use crate::codec::{read_value_count, write_value_count};
use crate::model::Item;

/// Закодировать все записи Item'а последовательно, в его порядке.
pub fn write_item(item: &Item, w: &mut impl Write) -> Result<()> {
    for vc in &item.values {
        write_value_count(w, vc)
            .with_context(|| format!("write record of item '{}'", item.key))?;
    }
    Ok(())
}

/// Декодировать записи до конца потока в новый Item с данным ключом.
/// Пустой поток — валидный Item без записей.
pub fn read_item(key: &str, r: &mut impl Read) -> Result<Item> {
    let mut item = Item::new(key);
    while let Some(vc) =
        read_value_count(r).with_context(|| format!("decode item '{}'", key))?
    {
        item.push(vc);
    }
    Ok(item)
}
