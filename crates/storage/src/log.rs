//! Physical transaction log.
//!
//! A committed write transaction is recorded as a flat sequence of
//! `Instruction`s. Row, value and column instructions apply to the most
//! recently selected table; link-list instructions apply to the most recently
//! selected list of that table. Tables, columns and rows are addressed by
//! their physical position at the moment the instruction was written.

use alloc::string::String;
use alloc::vec::Vec;
use tether_core::{DataType, Value};

/// A single entry of the transaction log.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// Selects the table subsequent row and column instructions apply to.
    SelectTable { table: usize },
    /// Selects a link list of the selected table.
    SelectLinkList { column: usize, row: usize },

    /// `count` empty rows were inserted at `row`.
    InsertEmptyRows {
        row: usize,
        count: usize,
        prior_size: usize,
    },
    /// `row` was deleted by moving the last row over it.
    MoveLastOver { row: usize, prior_size: usize },
    /// Two rows exchanged positions.
    SwapRows { row1: usize, row2: usize },
    /// Every row of the selected table was deleted.
    ClearTable { prior_size: usize },

    /// A cell was assigned.
    Set {
        column: usize,
        row: usize,
        value: Value,
        is_default: bool,
    },
    /// A link cell was cleared because its target row was deleted.
    NullifyLink { column: usize, row: usize },

    LinkListInsert { index: usize, target: usize },
    LinkListSet { index: usize, target: usize },
    LinkListErase { index: usize },
    /// A list entry was removed because its target row was deleted.
    LinkListNullify { index: usize },
    LinkListMove { from: usize, to: usize },
    LinkListSwap { index1: usize, index2: usize },
    LinkListClear { prior_size: usize },

    InsertTable { table: usize, name: String },
    EraseTable { table: usize },
    RenameTable { table: usize, name: String },
    MoveTable { from: usize, to: usize },
    /// A column was inserted into the selected table.
    InsertColumn {
        column: usize,
        name: String,
        data_type: DataType,
        link_target: Option<String>,
    },
    EraseColumn { column: usize },
    RenameColumn { column: usize, name: String },
    MoveColumn { from: usize, to: usize },
    AddSearchIndex { column: usize },
    RemoveSearchIndex { column: usize },
}

impl Instruction {
    /// Returns true for instructions that act on the selected link list.
    pub fn is_list_instruction(&self) -> bool {
        matches!(
            self,
            Instruction::LinkListInsert { .. }
                | Instruction::LinkListSet { .. }
                | Instruction::LinkListErase { .. }
                | Instruction::LinkListNullify { .. }
                | Instruction::LinkListMove { .. }
                | Instruction::LinkListSwap { .. }
                | Instruction::LinkListClear { .. }
        )
    }

    /// Returns true for instructions that insert, erase or reorder tables.
    pub fn is_table_structure_change(&self) -> bool {
        matches!(
            self,
            Instruction::InsertTable { .. }
                | Instruction::EraseTable { .. }
                | Instruction::RenameTable { .. }
                | Instruction::MoveTable { .. }
        )
    }

    /// Returns true for instructions that change the shape of the schema.
    pub fn is_schema_change(&self) -> bool {
        self.is_table_structure_change()
            || matches!(
                self,
                Instruction::InsertColumn { .. }
                    | Instruction::EraseColumn { .. }
                    | Instruction::RenameColumn { .. }
                    | Instruction::MoveColumn { .. }
                    | Instruction::AddSearchIndex { .. }
                    | Instruction::RemoveSearchIndex { .. }
            )
    }
}

/// The instructions of one write transaction.
///
/// The writer keeps track of the current selection so that consecutive
/// instructions on the same table or list share one select entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactLog {
    instructions: Vec<Instruction>,
    selected_table: Option<usize>,
    selected_list: Option<(usize, usize)>,
}

impl TransactLog {
    /// Creates a new empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded instructions.
    #[inline]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Returns an iterator over the instructions.
    pub fn iter(&self) -> core::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    fn select_table(&mut self, table: usize) {
        if self.selected_table != Some(table) {
            self.instructions.push(Instruction::SelectTable { table });
            self.selected_table = Some(table);
            self.selected_list = None;
        }
    }

    /// Records an instruction on `table`: a row, value or column change.
    pub fn table_op(&mut self, table: usize, instruction: Instruction) {
        debug_assert!(!instruction.is_list_instruction());
        debug_assert!(!instruction.is_table_structure_change());
        self.select_table(table);
        self.selected_list = None;
        self.instructions.push(instruction);
    }

    /// Records an instruction on the link list at `(column, row)` of `table`.
    pub fn list_op(&mut self, table: usize, column: usize, row: usize, instruction: Instruction) {
        debug_assert!(instruction.is_list_instruction());
        self.select_table(table);
        if self.selected_list != Some((column, row)) {
            self.instructions
                .push(Instruction::SelectLinkList { column, row });
            self.selected_list = Some((column, row));
        }
        self.instructions.push(instruction);
    }

    /// Appends an instruction as given, selects included. The writer's
    /// selection is forgotten.
    pub fn push(&mut self, instruction: Instruction) {
        self.selected_table = None;
        self.selected_list = None;
        self.instructions.push(instruction);
    }

    /// Records a change to the set or order of tables. Positions shift, so
    /// the next table instruction selects again.
    pub fn group_op(&mut self, instruction: Instruction) {
        debug_assert!(instruction.is_table_structure_change());
        self.selected_table = None;
        self.selected_list = None;
        self.instructions.push(instruction);
    }
}

impl<'a> IntoIterator for &'a TransactLog {
    type Item = &'a Instruction;
    type IntoIter = core::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}
