//! Validation of schema changes committed by other writers.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use tether_core::schema::Schema;
use tether_core::{Error, Result, SchemaMode};
use tether_storage::{Instruction, TransactLog};

struct TableShape {
    name: String,
    columns: Vec<String>,
    /// Created within the validated range.
    is_new: bool,
}

/// Checks that the schema changes of a range of logs are ones an observer
/// running in `mode` can follow.
///
/// New tables and search index changes are always accepted, as is anything
/// done to a table created in the same range. Additive mode also accepts new
/// columns and reordering of columns and tables. Renames and removals are
/// never accepted.
pub struct SchemaChangeValidator {
    mode: SchemaMode,
    tables: Vec<TableShape>,
    selected: Option<usize>,
    errors: Vec<String>,
}

impl SchemaChangeValidator {
    /// Starts validating changes made on top of `schema`.
    pub fn new(schema: &Schema, mode: SchemaMode) -> Self {
        let tables = schema
            .tables()
            .iter()
            .map(|t| TableShape {
                name: t.name().to_string(),
                columns: t.columns().iter().map(|c| c.name().to_string()).collect(),
                is_new: false,
            })
            .collect();
        Self {
            mode,
            tables,
            selected: None,
            errors: Vec::new(),
        }
    }

    /// Checks every schema change of `log`.
    pub fn check(&mut self, log: &TransactLog) -> Result<()> {
        self.selected = None;
        for instruction in log {
            self.check_instruction(instruction)?;
        }
        Ok(())
    }

    /// Returns `SchemaMismatch` listing every rejected change.
    pub fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(Error::SchemaMismatch {
            errors: self.errors,
        })
    }

    fn check_instruction(&mut self, instruction: &Instruction) -> Result<()> {
        let additive = self.mode.allows_additive_changes();
        match instruction {
            Instruction::SelectTable { table } => {
                self.table(*table)?;
                self.selected = Some(*table);
            }
            Instruction::InsertTable { table, name } => {
                if *table > self.tables.len() {
                    return Err(Error::invalid_log(format!("cannot insert table at {}", table)));
                }
                self.tables.insert(
                    *table,
                    TableShape {
                        name: name.clone(),
                        columns: Vec::new(),
                        is_new: true,
                    },
                );
                self.selected = None;
            }
            Instruction::EraseTable { table } => {
                let shape = self.table(*table)?;
                if !shape.is_new {
                    let message = format!("Table '{}' has been removed.", shape.name);
                    self.errors.push(message);
                }
                self.tables.remove(*table);
                self.selected = None;
            }
            Instruction::RenameTable { table, name } => {
                let shape = self.table(*table)?;
                if !shape.is_new {
                    let message = format!("Table '{}' has been renamed to '{}'.", shape.name, name);
                    self.errors.push(message);
                }
                self.tables[*table].name = name.clone();
                self.selected = None;
            }
            Instruction::MoveTable { from, to } => {
                let shape = self.table(*from)?;
                if !shape.is_new && !additive {
                    let message = format!("Table '{}' has been moved.", shape.name);
                    self.errors.push(message);
                }
                if *to >= self.tables.len() {
                    return Err(Error::invalid_log(format!("cannot move table to {}", to)));
                }
                let shape = self.tables.remove(*from);
                self.tables.insert(*to, shape);
                self.selected = None;
            }
            Instruction::InsertColumn { column, name, .. } => {
                let (table, is_new) = self.selected_table()?;
                if *column > self.tables[table].columns.len() {
                    return Err(Error::invalid_log(format!("cannot insert column at {}", column)));
                }
                if !is_new && !additive {
                    let message =
                        format!("Column '{}.{}' has been added.", self.tables[table].name, name);
                    self.errors.push(message);
                }
                self.tables[table].columns.insert(*column, name.clone());
            }
            Instruction::EraseColumn { column } => {
                let (table, is_new) = self.selected_table()?;
                let name = self.column_name(table, *column)?;
                if !is_new {
                    self.errors.push(format!("Column '{}' has been removed.", name));
                }
                self.tables[table].columns.remove(*column);
            }
            Instruction::RenameColumn { column, name } => {
                let (table, is_new) = self.selected_table()?;
                let old = self.column_name(table, *column)?;
                if !is_new {
                    self.errors
                        .push(format!("Column '{}' has been renamed to '{}'.", old, name));
                }
                self.tables[table].columns[*column] = name.clone();
            }
            Instruction::MoveColumn { from, to } => {
                let (table, is_new) = self.selected_table()?;
                let name = self.column_name(table, *from)?;
                self.column_name(table, *to)?;
                if !is_new && !additive {
                    self.errors.push(format!("Column '{}' has been moved.", name));
                }
                let columns = &mut self.tables[table].columns;
                let moved = columns.remove(*from);
                columns.insert(*to, moved);
            }
            _ => {}
        }
        Ok(())
    }

    fn table(&self, table: usize) -> Result<&TableShape> {
        self.tables
            .get(table)
            .ok_or_else(|| Error::invalid_log(format!("unknown table {}", table)))
    }

    fn selected_table(&self) -> Result<(usize, bool)> {
        let table = self
            .selected
            .ok_or_else(|| Error::invalid_log("column change without a selected table"))?;
        Ok((table, self.tables[table].is_new))
    }

    fn column_name(&self, table: usize, column: usize) -> Result<String> {
        let shape = &self.tables[table];
        let name = shape
            .columns
            .get(column)
            .ok_or_else(|| Error::invalid_log(format!("unknown column {} of '{}'", column, shape.name)))?;
        Ok(format!("{}.{}", shape.name, name))
    }
}

/// Validates the schema changes of `logs`, applied in order on top of
/// `schema`.
pub fn validate_schema_changes(schema: &Schema, logs: &[TransactLog], mode: SchemaMode) -> Result<()> {
    let mut validator = SchemaChangeValidator::new(schema, mode);
    for log in logs {
        validator.check(log)?;
    }
    validator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use tether_core::DataType;

    fn schema() -> Schema {
        let person = tether_core::schema::TableBuilder::new("person")
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .add_column("age", DataType::Int)
            .unwrap()
            .build()
            .unwrap();
        Schema::from_tables(vec![person]).unwrap()
    }

    fn log(instructions: Vec<Instruction>) -> TransactLog {
        let mut log = TransactLog::new();
        for instruction in instructions {
            log.push(instruction);
        }
        log
    }

    fn insert_column(column: usize, name: &str) -> Instruction {
        Instruction::InsertColumn {
            column,
            name: name.into(),
            data_type: DataType::Int,
            link_target: None,
        }
    }

    fn errors(result: Result<()>) -> Vec<String> {
        match result {
            Err(Error::SchemaMismatch { errors }) => errors,
            other => panic!("expected a schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_new_table_allowed_in_both_modes() {
        let logs = [log(vec![
            Instruction::InsertTable {
                table: 0,
                name: "dog".into(),
            },
            Instruction::SelectTable { table: 0 },
            insert_column(0, "age"),
            Instruction::RenameColumn {
                column: 0,
                name: "years".into(),
            },
            Instruction::SelectTable { table: 1 },
            Instruction::AddSearchIndex { column: 0 },
        ])];
        assert!(validate_schema_changes(&schema(), &logs, SchemaMode::Automatic).is_ok());
        assert!(validate_schema_changes(&schema(), &logs, SchemaMode::Additive).is_ok());
    }

    #[test]
    fn test_additive_changes() {
        let logs = [log(vec![
            Instruction::SelectTable { table: 0 },
            insert_column(2, "email"),
            Instruction::MoveColumn { from: 0, to: 1 },
        ])];
        assert!(validate_schema_changes(&schema(), &logs, SchemaMode::Additive).is_ok());
        assert_eq!(
            errors(validate_schema_changes(&schema(), &logs, SchemaMode::Automatic)),
            vec![
                "Column 'person.email' has been added.".to_string(),
                "Column 'person.name' has been moved.".to_string(),
            ]
        );
    }

    #[test]
    fn test_destructive_changes_always_rejected() {
        let logs = [
            log(vec![
                Instruction::SelectTable { table: 0 },
                Instruction::RenameColumn {
                    column: 1,
                    name: "years".into(),
                },
            ]),
            log(vec![
                Instruction::SelectTable { table: 0 },
                Instruction::EraseColumn { column: 0 },
                Instruction::RenameTable {
                    table: 0,
                    name: "human".into(),
                },
            ]),
        ];
        let found = errors(validate_schema_changes(&schema(), &logs, SchemaMode::Additive));
        assert_eq!(
            found,
            vec![
                "Column 'person.age' has been renamed to 'years'.".to_string(),
                "Column 'person.name' has been removed.".to_string(),
                "Table 'person' has been renamed to 'human'.".to_string(),
            ]
        );
    }

    #[test]
    fn test_erase_table_rejected() {
        let logs = [log(vec![Instruction::EraseTable { table: 0 }])];
        let found = errors(validate_schema_changes(&schema(), &logs, SchemaMode::Additive));
        assert_eq!(found, vec!["Table 'person' has been removed.".to_string()]);
    }

    #[test]
    fn test_move_table_strict_only() {
        let logs = [log(vec![
            Instruction::InsertTable {
                table: 1,
                name: "dog".into(),
            },
            Instruction::MoveTable { from: 0, to: 1 },
        ])];
        assert!(validate_schema_changes(&schema(), &logs, SchemaMode::Additive).is_ok());
        assert_eq!(
            errors(validate_schema_changes(&schema(), &logs, SchemaMode::Automatic)).len(),
            1
        );
    }

    #[test]
    fn test_malformed_log() {
        let logs = [log(vec![insert_column(0, "x")])];
        assert!(matches!(
            validate_schema_changes(&schema(), &logs, SchemaMode::Additive),
            Err(Error::InvalidLog { .. })
        ));
        let logs = [log(vec![Instruction::SelectTable { table: 4 }])];
        assert!(validate_schema_changes(&schema(), &logs, SchemaMode::Additive).is_err());
    }
}
