//! diff — направленная разница двух снапшотов.
//!
//! Результат: всё, что есть в newer и отсутствует в older, по ключам и по
//! точному совпадению байтов значения. Счётчики и таймстемпы выживших
//! записей копируются как есть (никакого мёржа и пересчёта).
//!
//! Семантика — каноническая разность множеств values(newer) \ values(older)
//! по каждому ключу; первая встреченная копия дубликата в newer побеждает.

use anyhow::Result;
use log::info;
use std::collections::HashSet;
use std::path::Path;

use crate::model::{Item, Snapshot};
use crate::store::read_snapshot;

/// Прочитать оба каталога и вернуть diff "newer минус older".
/// Имя результата: "{newer}-{older}".
pub fn diff_snapshots(older: &Path, newer: &Path) -> Result<Snapshot> {
    let older_snap = read_snapshot(older)?;
    let newer_snap = read_snapshot(newer)?;
    Ok(diff_loaded(&older_snap, &newer_snap))
}

/// Diff по уже загруженным снапшотам (диск не трогает).
pub fn diff_loaded(older: &Snapshot, newer: &Snapshot) -> Snapshot {
    let mut result = Snapshot::with_name(format!("{}-{}", newer.name, older.name));

    for item_b in &newer.items {
        match older.get(&item_b.key) {
            // Ключа нет в older — Item целиком попадает в результат.
            // Ключи newer уникальны, поэтому push без повторной проверки.
            None => {
                result.items.push(item_b.clone());
            }
            // Ключ есть в обоих — оставляем значения, которых older не видел.
            Some(item_a) => {
                let known: HashSet<&[u8]> =
                    item_a.values.iter().map(|vc| vc.value.as_slice()).collect();

                let mut kept: HashSet<&[u8]> = HashSet::new();
                let mut new_item = Item::new(&item_b.key);
                for vc in &item_b.values {
                    if known.contains(vc.value.as_slice()) {
                        continue;
                    }
                    // Дубликат внутри newer: в результат идёт первое вхождение.
                    if !kept.insert(vc.value.as_slice()) {
                        continue;
                    }
                    new_item.push(vc.clone());
                }

                // Пустой после фильтра ключ в результат не попадает.
                if !new_item.is_empty() {
                    result.items.push(new_item);
                }
            }
        }
    }

    info!(
        "diff: '{}' minus '{}' -> {} item(s)",
        newer.name,
        older.name,
        result.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueCount;

    fn vc(value: &[u8], count: u64) -> ValueCount {
        ValueCount::new(value.to_vec(), count, 100, 200)
    }

    fn snap(name: &str, items: &[(&str, &[(&[u8], u64)])]) -> Snapshot {
        let mut s = Snapshot::with_name(name);
        for (key, values) in items {
            let mut item = Item::new(*key);
            for (v, c) in *values {
                item.push(vc(v, *c));
            }
            s.insert(item).unwrap();
        }
        s
    }

    #[test]
    fn identity_diff_is_empty() {
        let s = snap("s", &[("k", &[(b"x", 3), (b"y", 1)])]);
        let d = diff_loaded(&s, &s);
        assert_eq!(d.name, "s-s");
        assert!(d.is_empty(), "diff(S, S) must have no items");
    }

    #[test]
    fn new_key_copied_whole() {
        let older = snap("old", &[("a", &[(b"x", 1)])]);
        let newer = snap("new", &[("a", &[(b"x", 1)]), ("b", &[(b"p", 2), (b"q", 5)])]);
        let d = diff_loaded(&older, &newer);
        assert_eq!(d.len(), 1);
        let b = d.get("b").expect("key b must be present");
        assert_eq!(b.len(), 2);
        assert_eq!(b.get(b"q").unwrap().count, 5, "count preserved");
    }

    #[test]
    fn value_level_filtering_preserves_counts() {
        let older = snap("old", &[("k", &[(b"x", 3), (b"y", 1)])]);
        let newer = snap("new", &[("k", &[(b"x", 5), (b"z", 2)])]);
        let d = diff_loaded(&older, &newer);
        let k = d.get("k").expect("key k");
        assert_eq!(k.len(), 1, "only z survives");
        let z = k.get(b"z").expect("z survives");
        assert_eq!(z.count, 2, "original count, not recomputed");
        assert!(k.get(b"x").is_none(), "x matched by value, excluded");
    }

    #[test]
    fn empty_after_filter_key_is_omitted() {
        let older = snap("old", &[("k", &[(b"x", 3), (b"y", 1)])]);
        let newer = snap("new", &[("k", &[(b"y", 9)])]);
        let d = diff_loaded(&older, &newer);
        assert!(d.get("k").is_none(), "key with no surviving values omitted");
        assert!(d.is_empty());
    }

    #[test]
    fn diff_is_asymmetric() {
        let a = snap("a", &[("k", &[(b"only-a", 1)])]);
        let b = snap("b", &[("k", &[(b"only-b", 1)])]);

        let ab = diff_loaded(&a, &b);
        assert!(ab.get("k").unwrap().get(b"only-b").is_some());
        assert!(ab.get("k").unwrap().get(b"only-a").is_none());

        let ba = diff_loaded(&b, &a);
        assert!(ba.get("k").unwrap().get(b"only-a").is_some());
        assert!(ba.get("k").unwrap().get(b"only-b").is_none());
    }

    #[test]
    fn duplicate_values_in_newer_kept_once() {
        let older = snap("old", &[("k", &[(b"seen", 1)])]);
        let mut newer = snap("new", &[]);
        let mut item = Item::new("k");
        item.push(vc(b"dup", 4));
        item.push(vc(b"dup", 9));
        item.push(vc(b"seen", 2));
        newer.insert(item).unwrap();

        let d = diff_loaded(&older, &newer);
        let k = d.get("k").expect("key k");
        assert_eq!(k.len(), 1, "duplicate kept once");
        assert_eq!(k.get(b"dup").unwrap().count, 4, "first occurrence wins");
    }

    #[test]
    fn result_name_is_newer_dash_older() {
        let a = snap("2024-01-01", &[]);
        let b = snap("2024-02-01", &[]);
        let d = diff_loaded(&a, &b);
        assert_eq!(d.name, "2024-02-01-2024-01-01");
    }
}
