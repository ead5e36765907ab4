pub mod edit;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const FIRST_NAME: &str = "First Name";
pub const LAST_NAME: &str = "Last Name";

/// Sentinel grouping column meaning "do not group".
pub const NO_GROUPING: &str = "None";

/// A single roster row: column name -> cell value, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Student {
    fields: IndexMap<String, String>,
}

impl Student {
    /// Convenience constructor for the two required name columns.
    pub fn named(first: &str, last: &str) -> Self {
        [(FIRST_NAME, first), (LAST_NAME, last)].into_iter().collect()
    }

    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.set(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn set(&mut self, column: &str, value: &str) {
        if let Some(cell) = self.fields.get_mut(column) {
            *cell = value.to_string();
        } else {
            self.fields.insert(column.to_string(), value.to_string());
        }
    }

    pub fn first_name(&self) -> &str {
        self.get(FIRST_NAME).unwrap_or("")
    }

    pub fn last_name(&self) -> &str {
        self.get(LAST_NAME).unwrap_or("")
    }

    /// Value used to place this student in a subgroup; a missing cell groups as "".
    pub fn group_key(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Student {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Ordered list of students as stored and edited in the roster editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new(students: Vec<Student>) -> Self {
        Self { students }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Column names taken from the first row; an empty roster still shows the name columns.
    pub fn headers(&self) -> Vec<String> {
        match self.students.first() {
            Some(student) => student.columns().map(str::to_string).collect(),
            None => vec![FIRST_NAME.to_string(), LAST_NAME.to_string()],
        }
    }

    /// Options offered for the grouping dropdown: the "None" sentinel, then every column.
    pub fn grouping_columns(&self) -> Vec<String> {
        let mut columns = vec![NO_GROUPING.to_string()];
        if !self.students.is_empty() {
            columns.extend(self.headers());
        }
        columns
    }
}

impl From<Vec<Student>> for Roster {
    fn from(students: Vec<Student>) -> Self {
        Self::new(students)
    }
}
