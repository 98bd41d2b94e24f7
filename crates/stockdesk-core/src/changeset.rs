//! # Sheet Edit Tracking
//!
//! In-memory edit tracking for the spreadsheet-like table views.
//!
//! Every row carries a flag set describing its lifecycle relative to the
//! database snapshot it was loaded from:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Row Flag State Machine                              │
//! │                                                                         │
//! │            edit (differs from baseline)                                 │
//! │  Original ───────────────────────────────► Changed                      │
//! │     │  ▲                                      │                         │
//! │     │  └──── edit (matches baseline again) ───┘                         │
//! │     │                                                                   │
//! │     │ toggle delete                 toggle delete                       │
//! │     ▼                                    ▼                              │
//! │  Deleted ◄──────────────────────── Changed|Deleted                      │
//! │     │  (toggle again restores the previous flags)                       │
//! │     │                                                                   │
//! │  append ──► New ── toggle delete ──► (row dropped, nothing staged)      │
//! │                                                                         │
//! │  save: deletes → inserts → updates, flags cleared per successful op     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Flags are bits (New=1, Changed=2, Deleted=4) so Deleted can be toggled on
//! top of Changed without losing it, and Original is simply the empty set.
//!
//! [`SheetEditor`] owns the working rows plus a baseline snapshot. The
//! baseline drives two behaviors: an edit only sets Changed if the row now
//! actually differs from its loaded state, and discarding reverts to it.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::types::Record;

// =============================================================================
// Row Flags
// =============================================================================

/// Per-row lifecycle flags, tracked client-side until a save commits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RowFlags(u8);

impl RowFlags {
    /// Unmodified row, as loaded from the database.
    pub const ORIGINAL: RowFlags = RowFlags(0);
    /// Appended locally, not yet inserted.
    pub const NEW: RowFlags = RowFlags(1);
    /// Differs from its baseline row.
    pub const CHANGED: RowFlags = RowFlags(2);
    /// Staged for deletion; excluded from edits until toggled back.
    pub const DELETED: RowFlags = RowFlags(4);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_original(self) -> bool {
        self.0 == 0
    }

    pub fn is_new(self) -> bool {
        self.0 & Self::NEW.0 != 0
    }

    pub fn is_changed(self) -> bool {
        self.0 & Self::CHANGED.0 != 0
    }

    pub fn is_deleted(self) -> bool {
        self.0 & Self::DELETED.0 != 0
    }

    pub fn insert(&mut self, flag: RowFlags) {
        self.0 |= flag.0;
    }

    pub fn remove(&mut self, flag: RowFlags) {
        self.0 &= !flag.0;
    }

    /// XOR toggle, used for the delete flag so a second toggle restores the
    /// row's previous state.
    pub fn toggle(&mut self, flag: RowFlags) {
        self.0 ^= flag.0;
    }
}

// =============================================================================
// Edit Levels
// =============================================================================

/// Column-level access control, ordered from least to most restricted.
///
/// A cell is editable when its column level is at or below the effective
/// level of the editor: admins act at `AdminModifiable`, everyone else at
/// `UserModifiable`, and any user acts at `Creatable` while the row is
/// still New (creation fills columns that are frozen afterwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EditLevel {
    UserModifiable,
    AdminModifiable,
    Creatable,
    NotEditable,
}

/// Whether a cell at `column_level` accepts edits from a user acting at
/// `user_level`, given the row's New status.
pub fn is_cell_editable(column_level: EditLevel, user_level: EditLevel, row_is_new: bool) -> bool {
    let effective = if row_is_new {
        EditLevel::Creatable
    } else {
        user_level
    };
    column_level <= effective
}

// =============================================================================
// Sheet Rows
// =============================================================================

/// A working row: the record plus its lifecycle flags.
#[derive(Debug, Clone)]
pub struct SheetRow<T> {
    pub record: T,
    pub flags: RowFlags,
}

// =============================================================================
// Change Batch
// =============================================================================

/// The staged changes drained from a sheet, in save order.
///
/// Save always processes deletes, then inserts, then updates — a renamed
/// row must not collide with a same-named row staged for deletion.
#[derive(Debug, Clone)]
pub struct ChangeBatch<T> {
    pub delete_ids: Vec<i64>,
    pub inserts: Vec<T>,
    pub updates: Vec<T>,
}

impl<T> ChangeBatch<T> {
    pub fn is_empty(&self) -> bool {
        self.delete_ids.is_empty() && self.inserts.is_empty() && self.updates.is_empty()
    }
}

// =============================================================================
// Save Outcome
// =============================================================================

/// Result of one of the three batch operations.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "camelCase")]
pub enum OpStatus {
    /// Nothing was staged for this operation.
    Skipped,
    /// The operation committed; carries the affected row count.
    Applied(u64),
    /// The operation rolled back; carries the error message for the dialog.
    Failed(String),
}

impl OpStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, OpStatus::Applied(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, OpStatus::Failed(_))
    }
}

/// Per-operation results of one save. Operations are independent: a failed
/// insert does not undo committed deletes, it just leaves the New rows
/// staged for a re-attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub deletes: OpStatus,
    pub inserts: OpStatus,
    pub updates: OpStatus,
}

impl SaveOutcome {
    pub fn skipped() -> Self {
        SaveOutcome {
            deletes: OpStatus::Skipped,
            inserts: OpStatus::Skipped,
            updates: OpStatus::Skipped,
        }
    }

    /// True when no staged operation failed.
    pub fn fully_applied(&self) -> bool {
        !self.deletes.is_failed() && !self.inserts.is_failed() && !self.updates.is_failed()
    }
}

// =============================================================================
// Sheet Editor
// =============================================================================

/// Edit-tracking state for one table view.
///
/// Holds the baseline snapshot (rows as loaded) and the working rows with
/// flags. All mutation goes through [`edit`](SheetEditor::edit),
/// [`append_with`](SheetEditor::append_with) and
/// [`toggle_delete`](SheetEditor::toggle_delete) so the flags stay truthful.
#[derive(Debug, Clone)]
pub struct SheetEditor<T: Record> {
    baseline: Vec<T>,
    rows: Vec<SheetRow<T>>,
}

impl<T: Record> SheetEditor<T> {
    pub fn new() -> Self {
        SheetEditor {
            baseline: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Replaces the sheet with a fresh database snapshot, clearing all
    /// staged edits.
    pub fn load(&mut self, records: Vec<T>) {
        self.rows = records
            .iter()
            .map(|r| SheetRow {
                record: r.clone(),
                flags: RowFlags::ORIGINAL,
            })
            .collect();
        self.baseline = records;
    }

    /// Appends further database rows without touching staged edits.
    ///
    /// This is the `load_more` path of paginated sheets: the new rows join
    /// as Original and extend the baseline.
    pub fn extend(&mut self, records: Vec<T>) {
        for record in records {
            self.baseline.push(record.clone());
            self.rows.push(SheetRow {
                record,
                flags: RowFlags::ORIGINAL,
            });
        }
    }

    pub fn rows(&self) -> &[SheetRow<T>] {
        &self.rows
    }

    pub fn get(&self, id: i64) -> Option<&SheetRow<T>> {
        self.rows.iter().find(|r| r.record.id() == id)
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.rows.iter().position(|r| r.record.id() == id)
    }

    fn baseline_row(&self, id: i64) -> Option<&T> {
        self.baseline.iter().find(|r| r.id() == id)
    }

    /// Provisional id for the next appended row: one past the largest id in
    /// the sheet. The database replaces it on insert.
    pub fn next_id(&self) -> i64 {
        self.rows
            .iter()
            .map(|r| r.record.id())
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Appends a New row built from the next provisional id.
    pub fn append_with(&mut self, build: impl FnOnce(i64) -> T) -> &SheetRow<T> {
        let next = self.next_id();
        let mut record = build(next);
        // The builder must not override the provisional id; staged rows are
        // addressed by it until the save remaps them.
        record.set_id(next);
        self.rows.push(SheetRow {
            record,
            flags: RowFlags::NEW,
        });
        self.rows.last().expect("row just pushed")
    }

    /// Applies `apply` to the addressed row.
    ///
    /// A row flagged Deleted rejects the edit. New rows stay New; other rows
    /// gain or lose the Changed flag depending on whether they now differ
    /// from their baseline row (editing a value back to the original clears
    /// the flag).
    pub fn edit(&mut self, id: i64, apply: impl FnOnce(&mut T)) -> CoreResult<&SheetRow<T>> {
        let idx = self.position(id).ok_or(CoreError::UnknownRow(id))?;
        if self.rows[idx].flags.is_deleted() {
            return Err(CoreError::DeletedRowEdit(id));
        }

        apply(&mut self.rows[idx].record);

        if !self.rows[idx].flags.is_new() {
            let differs = match self.baseline_row(id) {
                Some(base) => base != &self.rows[idx].record,
                // No baseline row means the id never came from the database;
                // treat it as changed so the edit is not silently lost.
                None => true,
            };
            if differs {
                self.rows[idx].flags.insert(RowFlags::CHANGED);
            } else {
                self.rows[idx].flags.remove(RowFlags::CHANGED);
            }
        }

        Ok(&self.rows[idx])
    }

    /// Toggles the delete flag on the addressed rows.
    ///
    /// New rows are simply dropped: they exist only locally, so there is
    /// nothing to stage. For all other rows the Deleted bit is XOR-ed, so
    /// toggling twice restores the row to its previous flags.
    pub fn toggle_delete(&mut self, ids: &[i64]) -> CoreResult<()> {
        // Validate all ids up front so a partial toggle never happens.
        for &id in ids {
            self.position(id).ok_or(CoreError::UnknownRow(id))?;
        }

        for &id in ids {
            let idx = self.position(id).expect("validated above");
            if self.rows[idx].flags.is_new() {
                self.rows.remove(idx);
            } else {
                self.rows[idx].flags.toggle(RowFlags::DELETED);
            }
        }
        Ok(())
    }

    /// Discards every staged edit: New rows are dropped, Changed rows revert
    /// to baseline, Deleted flags are cleared.
    pub fn discard(&mut self) {
        let baseline = self.baseline.clone();
        self.load(baseline);
    }

    /// Whether any row carries a non-Original flag.
    pub fn is_editing(&self) -> bool {
        self.rows.iter().any(|r| !r.flags.is_original())
    }

    /// Collects the staged changes in save order.
    ///
    /// A row flagged both Changed and Deleted is staged as a delete only;
    /// updating a row that is about to be removed would be wasted work.
    pub fn batch(&self) -> ChangeBatch<T> {
        let delete_ids = self
            .rows
            .iter()
            .filter(|r| r.flags.is_deleted())
            .map(|r| r.record.id())
            .collect();
        let inserts = self
            .rows
            .iter()
            .filter(|r| r.flags.is_new())
            .map(|r| r.record.clone())
            .collect();
        let updates = self
            .rows
            .iter()
            .filter(|r| r.flags.is_changed() && !r.flags.is_deleted())
            .map(|r| r.record.clone())
            .collect();
        ChangeBatch {
            delete_ids,
            inserts,
            updates,
        }
    }

    /// Clears flags for the operations that committed; rows belonging to a
    /// failed operation keep their flags so the batch can be re-attempted.
    ///
    /// After a fully applied save the caller normally reloads from the
    /// database anyway, so inserted rows pick up their authoritative ids.
    pub fn apply_outcome(&mut self, outcome: &SaveOutcome) {
        if outcome.deletes.is_applied() {
            let deleted_ids: Vec<i64> = self
                .rows
                .iter()
                .filter(|r| r.flags.is_deleted())
                .map(|r| r.record.id())
                .collect();
            self.rows.retain(|r| !r.flags.is_deleted());
            self.baseline.retain(|b| !deleted_ids.contains(&b.id()));
        }

        if outcome.inserts.is_applied() {
            for row in self.rows.iter_mut().filter(|r| r.flags.is_new()) {
                row.flags.remove(RowFlags::NEW);
                self.baseline.push(row.record.clone());
            }
        }

        if outcome.updates.is_applied() {
            for row in self
                .rows
                .iter_mut()
                .filter(|r| r.flags.is_changed() && !r.flags.is_deleted())
            {
                row.flags.remove(RowFlags::CHANGED);
                if let Some(base) = self.baseline.iter_mut().find(|b| b.id() == row.record.id()) {
                    *base = row.record.clone();
                }
            }
        }
    }
}

impl<T: Record> Default for SheetEditor<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn editor_with(names: &[&str]) -> SheetEditor<Category> {
        let mut editor = SheetEditor::new();
        editor.load(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| Category {
                    category_id: i as i64 + 1,
                    category_name: n.to_string(),
                })
                .collect(),
        );
        editor
    }

    #[test]
    fn test_load_starts_original() {
        let editor = editor_with(&["Topical", "Infusion"]);
        assert_eq!(editor.rows().len(), 2);
        assert!(editor.rows().iter().all(|r| r.flags.is_original()));
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_edit_sets_changed_only_when_differs() {
        let mut editor = editor_with(&["Topical"]);

        let row = editor
            .edit(1, |c| c.category_name = "Ointment".to_string())
            .unwrap();
        assert!(row.flags.is_changed());

        // Editing back to the loaded value clears the flag
        let row = editor
            .edit(1, |c| c.category_name = "Topical".to_string())
            .unwrap();
        assert!(row.flags.is_original());
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_append_flags_new_and_assigns_next_id() {
        let mut editor = editor_with(&["Topical", "Infusion"]);
        let row = editor.append_with(|id| Category {
            category_id: id,
            category_name: "Support".to_string(),
        });
        assert_eq!(row.record.category_id, 3);
        assert!(row.flags.is_new());

        // Edits on a New row leave it New, never Changed
        let row = editor
            .edit(3, |c| c.category_name = "Brace".to_string())
            .unwrap();
        assert!(row.flags.is_new());
        assert!(!row.flags.is_changed());
    }

    #[test]
    fn test_toggle_delete_drops_new_rows() {
        let mut editor = editor_with(&["Topical"]);
        editor.append_with(|id| Category {
            category_id: id,
            category_name: "Misc".to_string(),
        });
        assert_eq!(editor.rows().len(), 2);

        editor.toggle_delete(&[2]).unwrap();
        // New row vanished, nothing staged
        assert_eq!(editor.rows().len(), 1);
        assert!(editor.batch().is_empty());
    }

    #[test]
    fn test_toggle_delete_is_a_toggle_for_loaded_rows() {
        let mut editor = editor_with(&["Topical"]);

        editor.toggle_delete(&[1]).unwrap();
        assert!(editor.get(1).unwrap().flags.is_deleted());

        // Deleted rows reject edits
        assert!(matches!(
            editor.edit(1, |c| c.category_name = "x".to_string()),
            Err(CoreError::DeletedRowEdit(1))
        ));

        editor.toggle_delete(&[1]).unwrap();
        assert!(editor.get(1).unwrap().flags.is_original());
    }

    #[test]
    fn test_toggle_delete_preserves_changed_bit() {
        let mut editor = editor_with(&["Topical"]);
        editor
            .edit(1, |c| c.category_name = "Ointment".to_string())
            .unwrap();

        editor.toggle_delete(&[1]).unwrap();
        let flags = editor.get(1).unwrap().flags;
        assert!(flags.is_deleted() && flags.is_changed());

        editor.toggle_delete(&[1]).unwrap();
        let flags = editor.get(1).unwrap().flags;
        assert!(!flags.is_deleted() && flags.is_changed());
    }

    #[test]
    fn test_unknown_row_rejected_before_any_toggle() {
        let mut editor = editor_with(&["Topical", "Infusion"]);
        assert!(matches!(
            editor.toggle_delete(&[1, 99]),
            Err(CoreError::UnknownRow(99))
        ));
        // Nothing was toggled
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_discard_reverts_everything() {
        let mut editor = editor_with(&["Topical", "Infusion"]);
        editor
            .edit(1, |c| c.category_name = "Ointment".to_string())
            .unwrap();
        editor.toggle_delete(&[2]).unwrap();
        editor.append_with(|id| Category {
            category_id: id,
            category_name: "Misc".to_string(),
        });

        editor.discard();

        assert_eq!(editor.rows().len(), 2);
        assert_eq!(editor.get(1).unwrap().record.category_name, "Topical");
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_batch_collects_in_save_order() {
        let mut editor = editor_with(&["Topical", "Infusion", "Support"]);
        editor.toggle_delete(&[1]).unwrap();
        editor
            .edit(2, |c| c.category_name = "Fluids".to_string())
            .unwrap();
        editor.append_with(|id| Category {
            category_id: id,
            category_name: "Misc".to_string(),
        });

        let batch = editor.batch();
        assert_eq!(batch.delete_ids, vec![1]);
        assert_eq!(batch.inserts.len(), 1);
        assert_eq!(batch.inserts[0].category_name, "Misc");
        assert_eq!(batch.updates.len(), 1);
        assert_eq!(batch.updates[0].category_name, "Fluids");
    }

    #[test]
    fn test_changed_and_deleted_row_staged_as_delete_only() {
        let mut editor = editor_with(&["Topical"]);
        editor
            .edit(1, |c| c.category_name = "Ointment".to_string())
            .unwrap();
        editor.toggle_delete(&[1]).unwrap();

        let batch = editor.batch();
        assert_eq!(batch.delete_ids, vec![1]);
        assert!(batch.updates.is_empty());
    }

    #[test]
    fn test_apply_outcome_clears_only_successful_ops() {
        let mut editor = editor_with(&["Topical", "Infusion"]);
        editor.toggle_delete(&[1]).unwrap();
        editor
            .edit(2, |c| c.category_name = "Fluids".to_string())
            .unwrap();
        editor.append_with(|id| Category {
            category_id: id,
            category_name: "Misc".to_string(),
        });

        // Deletes and updates committed, inserts hit a duplicate name
        let outcome = SaveOutcome {
            deletes: OpStatus::Applied(1),
            inserts: OpStatus::Failed("duplicate".to_string()),
            updates: OpStatus::Applied(1),
        };
        editor.apply_outcome(&outcome);

        // Deleted row is gone for good
        assert!(editor.get(1).is_none());
        // Updated row settled into the new baseline
        let row = editor.get(2).unwrap();
        assert!(row.flags.is_original());
        assert!(editor
            .edit(2, |c| c.category_name = "Fluids".to_string())
            .unwrap()
            .flags
            .is_original());
        // Failed insert stays staged for a re-attempt
        let batch = editor.batch();
        assert_eq!(batch.inserts.len(), 1);
        assert!(batch.delete_ids.is_empty());
        assert!(batch.updates.is_empty());
    }

    #[test]
    fn test_apply_outcome_full_success_clears_all() {
        let mut editor = editor_with(&["Topical"]);
        editor
            .edit(1, |c| c.category_name = "Ointment".to_string())
            .unwrap();
        editor.append_with(|id| Category {
            category_id: id,
            category_name: "Misc".to_string(),
        });

        let outcome = SaveOutcome {
            deletes: OpStatus::Skipped,
            inserts: OpStatus::Applied(1),
            updates: OpStatus::Applied(1),
        };
        assert!(outcome.fully_applied());
        editor.apply_outcome(&outcome);
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_extend_keeps_staged_edits() {
        let mut editor = editor_with(&["Topical"]);
        editor
            .edit(1, |c| c.category_name = "Ointment".to_string())
            .unwrap();

        editor.extend(vec![Category {
            category_id: 2,
            category_name: "Infusion".to_string(),
        }]);

        assert_eq!(editor.rows().len(), 2);
        assert!(editor.get(1).unwrap().flags.is_changed());
        assert!(editor.get(2).unwrap().flags.is_original());
        // Extended rows revert cleanly too
        editor.discard();
        assert_eq!(editor.get(1).unwrap().record.category_name, "Topical");
        assert_eq!(editor.rows().len(), 2);
    }

    #[test]
    fn test_edit_level_gating() {
        use EditLevel::*;

        // Admin edits admin-level cells, user does not
        assert!(is_cell_editable(AdminModifiable, AdminModifiable, false));
        assert!(!is_cell_editable(AdminModifiable, UserModifiable, false));

        // Creatable cells only open up on New rows
        assert!(!is_cell_editable(Creatable, AdminModifiable, false));
        assert!(is_cell_editable(Creatable, UserModifiable, true));

        // NotEditable is frozen even during creation
        assert!(!is_cell_editable(NotEditable, AdminModifiable, true));
    }
}
