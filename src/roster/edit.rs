use super::{Roster, Student, FIRST_NAME, LAST_NAME};
use crate::error::{Error, Result};

fn is_required(column: &str) -> bool {
    column == FIRST_NAME || column == LAST_NAME
}

impl Roster {
    /// Inserts a blank row before `index` (clamped to the end of the roster).
    /// Does nothing on an empty roster since there are no columns to copy.
    pub fn insert_row(&mut self, index: usize) {
        if self.students.is_empty() {
            return;
        }
        let blank: Student = self
            .headers()
            .into_iter()
            .map(|column| (column, String::new()))
            .collect();
        let index = index.min(self.students.len());
        self.students.insert(index, blank);
    }

    pub fn remove_row(&mut self, index: usize) -> Result<Student> {
        if index >= self.students.len() {
            return Err(Error::RowOutOfRange(index));
        }
        Ok(self.students.remove(index))
    }

    /// Adds an empty column directly after column `after` in every row.
    pub fn insert_column(&mut self, after: usize, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::ColumnOutOfRange(after));
        }
        if self.headers().iter().any(|h| h == name) {
            return Err(Error::DuplicateColumn(name.to_string()));
        }
        for student in &mut self.students {
            let position = (after + 1).min(student.fields.len());
            student
                .fields
                .shift_insert(position, name.to_string(), String::new());
        }
        Ok(())
    }

    /// Drops the column at `index`; the name columns cannot be removed.
    pub fn remove_column(&mut self, index: usize) -> Result<String> {
        let headers = self.headers();
        let column = headers
            .get(index)
            .cloned()
            .ok_or(Error::ColumnOutOfRange(index))?;
        if is_required(&column) {
            return Err(Error::RequiredColumn(column));
        }
        for student in &mut self.students {
            student.fields.shift_remove(&column);
        }
        Ok(column)
    }

    pub fn rename_column(&mut self, index: usize, new_name: &str) -> Result<()> {
        let headers = self.headers();
        let column = headers
            .get(index)
            .cloned()
            .ok_or(Error::ColumnOutOfRange(index))?;
        if is_required(&column) {
            return Err(Error::RequiredColumn(column));
        }
        let new_name = new_name.trim();
        if new_name == column {
            return Ok(());
        }
        if new_name.is_empty() {
            return Err(Error::ColumnOutOfRange(index));
        }
        if headers.iter().any(|h| h == new_name) {
            return Err(Error::DuplicateColumn(new_name.to_string()));
        }
        for student in &mut self.students {
            if let Some(position) = student.fields.get_index_of(&column) {
                let value = student.fields.shift_remove(&column).unwrap_or_default();
                student
                    .fields
                    .shift_insert(position, new_name.to_string(), value);
            }
        }
        Ok(())
    }

    pub fn set_cell(&mut self, row: usize, column: &str, value: &str) -> Result<()> {
        let student = self
            .students
            .get_mut(row)
            .ok_or(Error::RowOutOfRange(row))?;
        if student.get(column).is_none() {
            return Err(Error::UnknownColumn(column.to_string()));
        }
        student.set(column, value);
        Ok(())
    }
}
