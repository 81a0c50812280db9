//! snapdiff — именованные каталожные снапшоты наблюдений и направленный diff.
//!
//! Три операции:
//! - read_snapshot(dir) — загрузить снапшот целиком;
//! - write_snapshot(snapshot, base) — записать снапшот как каталог (write-once);
//! - diff_snapshots(older, newer) — всё, что есть в newer и отсутствует в older.

pub mod model;
pub mod codec;
pub mod item;
pub mod store;
pub mod diff;
pub mod util;
pub mod cli;

// Удобные реэкспорты
pub use diff::{diff_loaded, diff_snapshots};
pub use model::{Item, Snapshot, ValueCount};
pub use store::{read_snapshot, write_snapshot};
