use log::{debug, info, trace, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

use super::capacity::{effective_capacity, tables_remaining};
use super::groups::{GroupCursor, Subgroups};
use super::types::{
    Grouping, GroupingType, Seat, SeatingChart, SeatingPreferences, TableAssignment,
    SEATS_PER_ROW, TABLES_PER_ROW,
};
use crate::error::{Error, Result};
use crate::roster::{Roster, Student};

/// Where the next student comes from
enum Pool {
    Shuffled(VecDeque<Student>),
    Grouped {
        subgroups: Subgroups,
        mode: GroupingType,
    },
}

/// Counters threaded through one generation run
struct SeatingContext {
    total: usize,
    seated: usize,
    cursor: GroupCursor,
    diagnostics: Vec<String>,
}

impl SeatingContext {
    fn next_student(
        &mut self,
        pool: &mut Pool,
        students_per_table: usize,
        table_index: usize,
        seat_index: usize,
    ) -> Option<Student> {
        let student = match pool {
            Pool::Shuffled(queue) => queue.pop_front(),
            Pool::Grouped { subgroups, mode } => {
                let student = match mode {
                    GroupingType::Mixed => {
                        let tables_left =
                            tables_remaining(self.total, self.seated, students_per_table);
                        self.cursor.select_mixed(subgroups, tables_left)
                    }
                    GroupingType::Same => self.cursor.select_same(subgroups),
                };
                if student.is_none() {
                    let message = format!(
                        "Seat T{}-S{} is empty after searching every group for a student",
                        table_index + 1,
                        seat_index + 1
                    );
                    warn!("{}", message);
                    self.diagnostics.push(message);
                }
                student
            }
        };

        if student.is_some() {
            self.seated += 1;
        }
        student
    }
}

/// Generates a seating chart using the thread-local random number generator.
pub fn generate(
    roster: &Roster,
    prefs: &SeatingPreferences,
    grouping: &Grouping,
) -> Result<SeatingChart> {
    generate_with_rng(roster, prefs, grouping, &mut rand::thread_rng())
}

/// Generates a seating chart, drawing all randomness from `rng`.
///
/// Tables are filled in order until `num_tables` tables exist or every student
/// has a seat. The roster and preferences are only read.
pub fn generate_with_rng<R: Rng + ?Sized>(
    roster: &Roster,
    prefs: &SeatingPreferences,
    grouping: &Grouping,
    rng: &mut R,
) -> Result<SeatingChart> {
    if roster.is_empty() {
        return Err(Error::NoStudents);
    }

    let mut shuffled: Vec<Student> = roster.students().to_vec();
    shuffled.shuffle(rng);

    let mut pool = match grouping.column() {
        Some(column) => {
            let subgroups = Subgroups::build(&shuffled, column, rng);
            debug!(
                "Grouping by {:?} ({}): {:?}",
                column,
                grouping.mode(),
                subgroups.original_sizes().collect::<Vec<_>>()
            );
            Pool::Grouped {
                subgroups,
                mode: grouping.mode(),
            }
        }
        None => Pool::Shuffled(VecDeque::from(shuffled)),
    };

    // Random starting group so the same group does not always get the first seats
    let start_group = match &pool {
        Pool::Grouped { subgroups, .. } if !subgroups.is_empty() => {
            rng.gen_range(0..subgroups.len())
        }
        _ => 0,
    };

    let mut cx = SeatingContext {
        total: roster.len(),
        seated: 0,
        cursor: GroupCursor::starting_at(start_group),
        diagnostics: Vec::new(),
    };

    let mut tables = Vec::new();
    for table_index in 0..prefs.num_tables {
        if cx.seated >= cx.total {
            break;
        }

        let capacity = effective_capacity(cx.total, cx.seated, table_index, prefs);
        trace!(
            "Table {}: {} of {} students seated, capacity {}",
            table_index + 1,
            cx.seated,
            cx.total,
            capacity
        );

        let mut seats = Vec::with_capacity(capacity);
        for seat_index in 0..capacity {
            let student =
                cx.next_student(&mut pool, prefs.students_per_table, table_index, seat_index);
            seats.push(Seat {
                seat_number: seat_index + 1,
                sub_row: seat_index / SEATS_PER_ROW,
                student,
            });
        }

        let setting = prefs.table_setting(table_index);
        tables.push(TableAssignment {
            index: table_index,
            row: table_index / TABLES_PER_ROW,
            name: setting.name,
            color: setting.color,
            capacity,
            seats,
        });
    }

    info!(
        "Seated {} of {} students at {} tables",
        cx.seated,
        cx.total,
        tables.len()
    );

    Ok(SeatingChart {
        tables,
        diagnostics: cx.diagnostics,
    })
}
