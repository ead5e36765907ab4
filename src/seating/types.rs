use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::roster::{Student, NO_GROUPING};

pub const DEFAULT_TABLE_COLOR: &str = "#f9f9f9";
pub const DEFAULT_NUM_TABLES: usize = 8;
pub const DEFAULT_STUDENTS_PER_TABLE: usize = 4;
pub const DEFAULT_MIN_STUDENTS_PER_TABLE: usize = 3;
/// Table settings are kept for this many tables so that lowering `num_tables`
/// does not discard names and colors.
pub const TABLE_SETTING_SLOTS: usize = 40;
pub const TABLES_PER_ROW: usize = 4;
pub const SEATS_PER_ROW: usize = 2;

/// Display name and color for one table position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSetting {
    pub name: String,
    pub color: String,
}

impl TableSetting {
    pub fn default_for(index: usize) -> Self {
        Self {
            name: format!("Table {}", index + 1),
            color: DEFAULT_TABLE_COLOR.to_string(),
        }
    }

    /// Replaces a blank name or color with the default for `index`
    fn fill_blanks(&mut self, index: usize) {
        if self.name.trim().is_empty() {
            self.name = format!("Table {}", index + 1);
        }
        if self.color.trim().is_empty() {
            self.color = DEFAULT_TABLE_COLOR.to_string();
        }
    }
}

/// Classroom layout: table count, table size and per-table settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeatingPreferences {
    pub num_tables: usize,
    /// Target number of seats per table
    pub students_per_table: usize,
    /// Floor the shrink rule will not go below
    pub min_students_per_table: usize,
    pub table_settings: Vec<TableSetting>,
}

impl Default for SeatingPreferences {
    fn default() -> Self {
        Self {
            num_tables: DEFAULT_NUM_TABLES,
            students_per_table: DEFAULT_STUDENTS_PER_TABLE,
            min_students_per_table: DEFAULT_MIN_STUDENTS_PER_TABLE,
            table_settings: (0..TABLE_SETTING_SLOTS)
                .map(TableSetting::default_for)
                .collect(),
        }
    }
}

impl SeatingPreferences {
    pub fn new(num_tables: usize, students_per_table: usize, min_students_per_table: usize) -> Self {
        Self {
            num_tables,
            students_per_table,
            min_students_per_table,
            table_settings: Vec::new(),
        }
    }

    /// Settings for the table at `index`. A missing entry, blank name or blank color
    /// falls back to the default.
    pub fn table_setting(&self, index: usize) -> TableSetting {
        match self.table_settings.get(index) {
            Some(setting) => {
                let mut setting = setting.clone();
                setting.fill_blanks(index);
                setting
            }
            None => TableSetting::default_for(index),
        }
    }

    /// Restores every table name and color to its default.
    pub fn reset_table_settings(&mut self) {
        let slots = self.num_tables.max(TABLE_SETTING_SLOTS);
        self.table_settings = (0..slots).map(TableSetting::default_for).collect();
    }

    /// Fills blank names and colors, then adds missing entries up to the larger of
    /// `num_tables` and the stored slot count.
    pub fn pad_table_settings(&mut self) {
        for (index, setting) in self.table_settings.iter_mut().enumerate() {
            setting.fill_blanks(index);
        }
        let wanted = self.num_tables.max(TABLE_SETTING_SLOTS);
        for index in self.table_settings.len()..wanted {
            self.table_settings.push(TableSetting::default_for(index));
        }
    }
}

/// How grouped students are spread over tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupingType {
    /// Interleave the groups across seats and tables
    #[default]
    Mixed,
    /// Exhaust one group before moving on to the next
    Same,
}

impl FromStr for GroupingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mixed" => Ok(GroupingType::Mixed),
            "same" => Ok(GroupingType::Same),
            other => Err(format!("unknown grouping type: {}", other)),
        }
    }
}

impl fmt::Display for GroupingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupingType::Mixed => write!(f, "Mixed"),
            GroupingType::Same => write!(f, "Same"),
        }
    }
}

/// Which roster column (if any) students are grouped by
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    column: Option<String>,
    mode: GroupingType,
}

impl Grouping {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn by(column: &str, mode: GroupingType) -> Self {
        Self {
            column: Some(column.to_string()),
            mode,
        }
    }

    /// Builds a grouping from dropdown values, where "None" turns grouping off.
    pub fn from_selection(column: &str, mode: GroupingType) -> Self {
        if column.is_empty() || column == NO_GROUPING {
            Self { column: None, mode }
        } else {
            Self::by(column, mode)
        }
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn mode(&self) -> GroupingType {
        self.mode
    }
}

/// One seat at a table; `student` is `None` for a blank seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    /// 1-based position within the table
    pub seat_number: usize,
    /// Seats are drawn two to a row
    pub sub_row: usize,
    pub student: Option<Student>,
}

impl Seat {
    pub fn is_empty(&self) -> bool {
        self.student.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableAssignment {
    pub index: usize,
    /// Tables are drawn four to a row
    pub row: usize,
    pub name: String,
    pub color: String,
    /// Seats laid out after the shrink rule was applied
    pub capacity: usize,
    pub seats: Vec<Seat>,
}

impl TableAssignment {
    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.seats.iter().filter_map(|seat| seat.student.as_ref())
    }

    pub fn occupied(&self) -> usize {
        self.students().count()
    }
}

/// Output of one generation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingChart {
    pub tables: Vec<TableAssignment>,
    /// Non-fatal problems hit while seating, e.g. a grouped search that found no one
    pub diagnostics: Vec<String>,
}

impl SeatingChart {
    pub fn seated_count(&self) -> usize {
        self.tables.iter().map(TableAssignment::occupied).sum()
    }

    pub fn table_sizes(&self) -> Vec<usize> {
        self.tables.iter().map(TableAssignment::occupied).collect()
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.tables.iter().flat_map(TableAssignment::students)
    }
}
