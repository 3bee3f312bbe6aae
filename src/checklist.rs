//! Fixed room checklist shared by every session

use std::collections::BTreeSet;

/// Task descriptions, in display order
pub const CHECKLIST_ITEMS: [&str; 10] = [
    "Поверхности протерты от масла",
    "Ёмкости протерты от масла",
    "Антисептик долит",
    "Масла долиты",
    "Простынь перестелена",
    "Подголовник перестелен",
    "Мусор выкинут",
    "Дверь и ручка протерты от масла с обеих сторон",
    "Обогреватель выключен",
    "Чистые полотенца доложены",
];

/// Label shared by the checklist confirm button and the final reply keyboard
pub const CONFIRM_LABEL: &str = "✅ Подтвердить";

pub const CHECKED_GLYPH: &str = "✅";
pub const UNCHECKED_GLYPH: &str = "⬜️";
/// Marker used in the saved report for items left undone
pub const MISSED_GLYPH: &str = "❌";

/// Indices of checked items. Only ever holds indices valid for
/// [`CHECKLIST_ITEMS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckedItems(BTreeSet<usize>);

impl CheckedItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `index`.
    ///
    /// Returns the new checked status, or `None` when the index is outside
    /// the checklist (the set is left untouched).
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        if index >= CHECKLIST_ITEMS.len() {
            return None;
        }
        if self.0.remove(&index) {
            Some(false)
        } else {
            self.0.insert(index);
            Some(true)
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True once every item has been checked
    pub fn is_complete(&self) -> bool {
        self.0.len() == CHECKLIST_ITEMS.len()
    }
}

/// Render the per-item summary stored at checklist confirmation.
///
/// One `[✅] item` / `[❌] item` line per entry, in checklist order,
/// separated by `\n`.
pub fn render_snapshot(checked: &CheckedItems) -> String {
    CHECKLIST_ITEMS
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let mark = if checked.contains(i) {
                CHECKED_GLYPH
            } else {
                MISSED_GLYPH
            };
            format!("[{mark}] {item}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
