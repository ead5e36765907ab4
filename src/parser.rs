use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::roster::{Roster, Student};

/// Returns true when every cell in the record is blank
fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

/// Reads a roster from any CSV source.
///
/// The first non-blank line names the columns. Cells are trimmed, blank lines are
/// skipped, short rows are padded with empty cells and surplus cells are dropped.
pub fn read_roster<R: Read>(source: R) -> Result<Roster> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source);

    let mut records = reader.records();

    // Find the header row, skipping leading blank lines
    let headers = loop {
        match records.next() {
            Some(record) => {
                let record = record?;
                if !is_blank(&record) {
                    break record;
                }
            }
            None => return Err(Error::EmptyCsv),
        }
    };
    let headers: Vec<String> = headers.iter().map(str::to_string).collect();
    debug!("CSV columns: {:?}", headers);

    let mut students = Vec::new();
    for result in records {
        let record = result?;
        if is_blank(&record) {
            continue;
        }

        let student: Student = headers
            .iter()
            .enumerate()
            .map(|(i, column)| (column.as_str(), record.get(i).unwrap_or("")))
            .collect();
        students.push(student);
    }

    info!("Imported {} students from CSV", students.len());
    Ok(Roster::new(students))
}

/// Loads a roster from a CSV file
pub fn load_roster_csv<P: AsRef<Path>>(csv_path: P) -> Result<Roster> {
    let file = File::open(csv_path)?;
    read_roster(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{FIRST_NAME, LAST_NAME};

    #[test]
    fn test_reads_headers_and_rows() {
        let csv = "First Name,Last Name,Level\nAda,Lovelace,High\nAlan,Turing,Low\n";
        let roster = read_roster(csv.as_bytes()).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.headers(), vec![FIRST_NAME, LAST_NAME, "Level"]);
        assert_eq!(roster.students()[1].get("Level"), Some("Low"));
    }

    #[test]
    fn test_trims_cells_and_skips_blank_lines() {
        let csv = "\n First Name , Last Name \n\n  Ada ,  Lovelace \n,\n";
        let roster = read_roster(csv.as_bytes()).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.students()[0].first_name(), "Ada");
        assert_eq!(roster.students()[0].last_name(), "Lovelace");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let csv = "First Name,Last Name,Level\nAda\n";
        let roster = read_roster(csv.as_bytes()).unwrap();
        let student = &roster.students()[0];
        assert_eq!(student.last_name(), "");
        assert_eq!(student.get("Level"), Some(""));
    }

    #[test]
    fn test_long_rows_are_truncated() {
        let csv = "First Name,Last Name\nAda,Lovelace,extra\n";
        let roster = read_roster(csv.as_bytes()).unwrap();
        assert_eq!(roster.students()[0].len(), 2);
    }

    #[test]
    fn test_handles_crlf_line_endings() {
        let csv = "First Name,Last Name\r\nAda,Lovelace\r\n";
        let roster = read_roster(csv.as_bytes()).unwrap();
        assert_eq!(roster.students()[0].last_name(), "Lovelace");
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(read_roster("".as_bytes()), Err(Error::EmptyCsv)));
        assert!(matches!(read_roster("\n\n".as_bytes()), Err(Error::EmptyCsv)));
    }

    #[test]
    fn test_header_only_gives_empty_roster() {
        let roster = read_roster("First Name,Last Name\n".as_bytes()).unwrap();
        assert!(roster.is_empty());
    }
}
