//! model — in-memory структуры снапшота.
//!
//! Состав:
//! - ValueCount: одно наблюдаемое значение + счётчик + first/last seen.
//! - Item: упорядоченный список ValueCount одного ключа (ключ = имя файла).
//! - Snapshot: именованный набор Item'ов (имя = имя каталога).
//!
//! Порядок вставки сохраняется; lookup — линейный скан (кардинальность мала:
//! число отслеживаемых полей и значений на ключ). Уникальность ключей —
//! инвариант Snapshot, дубликат значения внутри Item допустим только через
//! прямой push (record() мёржит по значению).

use anyhow::{anyhow, Result};
use log::debug;

use crate::util::now_secs;

/// Одно наблюдаемое значение и его статистика.
/// value — точная байтовая последовательность (текст, но UTF-8 не требуется).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueCount {
    pub value: Vec<u8>,
    pub count: u64,
    pub first_time_seen: i64,
    pub last_time_seen: i64,
}

impl ValueCount {
    pub fn new(value: Vec<u8>, count: u64, first_time_seen: i64, last_time_seen: i64) -> Self {
        Self {
            value,
            count,
            first_time_seen,
            last_time_seen,
        }
    }

    /// Значение как текст для вывода (lossy — только для отображения).
    pub fn value_lossy(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }
}

/// Последовательность ValueCount одного ключа.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Item {
    pub key: String,
    pub values: Vec<ValueCount>,
}

impl Item {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            values: Vec::new(),
        }
    }

    /// Найти запись по точному совпадению байтов значения.
    pub fn get(&self, value: &[u8]) -> Option<&ValueCount> {
        self.values.iter().find(|vc| vc.value == value)
    }

    pub fn get_mut(&mut self, value: &[u8]) -> Option<&mut ValueCount> {
        self.values.iter_mut().find(|vc| vc.value == value)
    }

    pub fn push(&mut self, vc: ValueCount) {
        self.values.push(vc);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Именованный набор Item'ов. Имя снапшота = имя каталога при персистенции.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub name: String,
    pub items: Vec<Item>,
}

impl Snapshot {
    /// Пустой снапшот, названный по последней компоненте пути.
    /// Файловую систему не трогает.
    pub fn open(path: &std::path::Path) -> Self {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            name,
            items: Vec::new(),
        }
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Item> {
        self.items.iter().find(|it| it.key == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|it| it.key == key)
    }

    /// Добавить Item. Ошибка на невалидный ключ и на дубликат
    /// (инвариант: ключ встречается максимум один раз).
    pub fn insert(&mut self, item: Item) -> Result<()> {
        validate_key(&item.key)?;
        if self.get(&item.key).is_some() {
            return Err(anyhow!("duplicate item key '{}'", item.key));
        }
        self.items.push(item);
        Ok(())
    }

    /// Накопительный путь: зафиксировать наблюдение значения под ключом.
    /// Существующее значение — count+1 и last_time_seen=now;
    /// новое — запись с count=1 и first=last=now.
    pub fn record(&mut self, key: &str, value: &[u8]) -> Result<()> {
        validate_key(key)?;
        let now = now_secs();
        let idx = match self.items.iter().position(|it| it.key == key) {
            Some(i) => i,
            None => {
                self.items.push(Item::new(key));
                self.items.len() - 1
            }
        };
        let item = &mut self.items[idx];
        match item.get_mut(value) {
            Some(vc) => {
                vc.count += 1;
                vc.last_time_seen = now;
            }
            None => {
                debug!("record: new value under key '{}'", key);
                item.push(ValueCount::new(value.to_vec(), 1, now, now));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Проверка, что ключ способен прожить round-trip через каталог:
/// непустой, не начинается с '.' (read пропускает dot-файлы),
/// без разделителей пути и NUL.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(anyhow!("item key must not be empty"));
    }
    if key.starts_with('.') {
        return Err(anyhow!(
            "item key '{}' must not start with '.': dot entries are skipped on read",
            key
        ));
    }
    if key.contains('/') || key.contains('\\') || key.contains('\0') {
        return Err(anyhow!(
            "item key '{}' must not contain path separators or NUL",
            key
        ));
    }
    Ok(())
}
