use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

use crate::roster::Student;

/// Students split by the value of the grouping column, one shuffled queue per value.
///
/// Groups are indexed in the order their value is first seen. Queues are drained
/// from the front as seats are filled.
#[derive(Debug, Clone, Default)]
pub struct Subgroups {
    keys: Vec<String>,
    queues: Vec<VecDeque<Student>>,
    original_sizes: Vec<usize>,
}

impl Subgroups {
    pub fn build<R: Rng + ?Sized>(students: &[Student], column: &str, rng: &mut R) -> Self {
        let mut keys: Vec<String> = Vec::new();
        for student in students {
            let key = student.group_key(column);
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }

        let mut queues = Vec::with_capacity(keys.len());
        for key in &keys {
            let mut members: Vec<Student> = students
                .iter()
                .filter(|s| s.group_key(column) == key)
                .cloned()
                .collect();
            members.shuffle(rng);
            queues.push(VecDeque::from(members));
        }

        let original_sizes = queues.iter().map(VecDeque::len).collect();
        Self {
            keys,
            queues,
            original_sizes,
        }
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// (value, size before any student was taken) for each group
    pub fn original_sizes(&self) -> impl Iterator<Item = (&str, usize)> {
        self.keys
            .iter()
            .map(String::as_str)
            .zip(self.original_sizes.iter().copied())
    }

    pub fn queue_len(&self, group: usize) -> usize {
        self.queues.get(group).map_or(0, VecDeque::len)
    }

    pub fn pop(&mut self, group: usize) -> Option<Student> {
        self.queues.get_mut(group)?.pop_front()
    }

    /// Steps forward from `start` (wrapping) looking for a non-empty group,
    /// giving up after `max_probes` steps.
    pub fn probe_from(&self, start: usize, max_probes: usize) -> Option<usize> {
        let count = self.len();
        if count == 0 {
            return None;
        }
        (1..=max_probes)
            .map(|step| (start + step) % count)
            .find(|&group| self.queue_len(group) > 0)
    }
}

/// Rotating pointer into the subgroups plus the number of consecutive seats
/// taken from the current group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCursor {
    pub group: usize,
    pub streak: usize,
}

impl GroupCursor {
    pub fn starting_at(group: usize) -> Self {
        Self { group, streak: 0 }
    }

    /// Takes the next student for Mixed grouping.
    ///
    /// A group keeps the pointer while its streak stays within its fair share of
    /// the full tables still to fill (`queue_len / tables_remaining - 1`). With no
    /// full tables remaining the pointer never moves on streak alone. An empty
    /// group is skipped by probing up to twice the group count.
    pub fn select_mixed(
        &mut self,
        subgroups: &mut Subgroups,
        tables_remaining: usize,
    ) -> Option<Student> {
        let count = subgroups.len();
        if count == 0 {
            return None;
        }

        let advance = tables_remaining > 0 && {
            let share = subgroups.queue_len(self.group) as f64 / tables_remaining as f64;
            self.streak as f64 > share - 1.0
        };
        if advance {
            self.group = (self.group + 1) % count;
            self.streak = 0;
        } else {
            self.streak += 1;
        }

        if subgroups.queue_len(self.group) == 0 {
            self.group = subgroups.probe_from(self.group, count * 2)?;
        }
        subgroups.pop(self.group)
    }

    /// Takes the next student for Same grouping: drain the current group, then
    /// move to the next one that still has students.
    pub fn select_same(&mut self, subgroups: &mut Subgroups) -> Option<Student> {
        let count = subgroups.len();
        if count == 0 {
            return None;
        }

        if subgroups.queue_len(self.group) == 0 {
            self.group = subgroups.probe_from(self.group, count * 2)?;
        }
        subgroups.pop(self.group)
    }
}
