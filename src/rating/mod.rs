//! Rating data model and the source abstraction used to fetch it.

pub mod diff;
pub mod error;
pub mod html;
pub mod student;
pub mod subject;
pub mod table;
pub mod vsuet_source;

use async_trait::async_trait;

use crate::rating::error::RatingError;
use crate::rating::student::StudentId;
use crate::rating::subject::Subject;

/// Placeholder stored for empty or missing table cells.
pub const SENTINEL: &str = "—";

/// A named column of a student's row in the rating table.
///
/// Checkpoint variants carry the checkpoint number, 1 through 5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    ListNumber,
    RecordBook,
    Lectures(u8),
    Practicals(u8),
    CheckpointTotal(u8),
    OverallRating,
    Grade,
}

impl Field {
    /// Every extracted field, in display order.
    pub const ALL: [Field; 19] = [
        Field::ListNumber,
        Field::RecordBook,
        Field::Lectures(1),
        Field::Practicals(1),
        Field::CheckpointTotal(1),
        Field::Lectures(2),
        Field::Practicals(2),
        Field::CheckpointTotal(2),
        Field::Lectures(3),
        Field::Practicals(3),
        Field::CheckpointTotal(3),
        Field::Lectures(4),
        Field::Practicals(4),
        Field::CheckpointTotal(4),
        Field::Lectures(5),
        Field::Practicals(5),
        Field::CheckpointTotal(5),
        Field::OverallRating,
        Field::Grade,
    ];

    /// Fields monitored for changes, in reporting order.
    pub const WATCHED: [Field; 17] = [
        Field::Lectures(1),
        Field::Lectures(2),
        Field::Lectures(3),
        Field::Lectures(4),
        Field::Lectures(5),
        Field::Practicals(1),
        Field::Practicals(2),
        Field::Practicals(3),
        Field::Practicals(4),
        Field::Practicals(5),
        Field::CheckpointTotal(1),
        Field::CheckpointTotal(2),
        Field::CheckpointTotal(3),
        Field::CheckpointTotal(4),
        Field::CheckpointTotal(5),
        Field::OverallRating,
        Field::Grade,
    ];

    /// Index of the `<td>` cell holding this field within a student's row.
    pub fn column(&self) -> usize {
        let checkpoint_base = |n: u8| 5 * (n.clamp(1, 5) as usize - 1);
        match self {
            Field::ListNumber => 0,
            Field::RecordBook => 1,
            Field::Lectures(n) => 3 + checkpoint_base(*n),
            Field::Practicals(n) => 4 + checkpoint_base(*n),
            Field::CheckpointTotal(n) => 7 + checkpoint_base(*n),
            Field::OverallRating => 29,
            Field::Grade => 30,
        }
    }

    /// Human readable label, as shown on the rating site.
    pub fn label(&self) -> String {
        match self {
            Field::ListNumber => "Номер по списку".to_string(),
            Field::RecordBook => "Номер зачётной книжки".to_string(),
            Field::Lectures(n) => format!("Лекции КТ №{n}"),
            Field::Practicals(n) => format!("Практики КТ №{n}"),
            Field::CheckpointTotal(n) => format!("ИТОГ КТ №{n}"),
            Field::OverallRating => "Итоговый рейтинг по всем КТ".to_string(),
            Field::Grade => "Оценка".to_string(),
        }
    }

    /// Totals, overall rating and grade are highlighted when rendered.
    pub fn is_summary(&self) -> bool {
        matches!(
            self,
            Field::CheckpointTotal(_) | Field::OverallRating | Field::Grade
        )
    }
}

/// One scrape of a student's row: an insertion ordered field mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RatingFields {
    entries: Vec<(Field, String)>,
}

impl RatingFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any previous value in place.
    pub fn insert(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        self.entries.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(Field, S)> for RatingFields {
    fn from_iter<I: IntoIterator<Item = (Field, S)>>(iter: I) -> Self {
        let mut fields = RatingFields::new();
        for (field, value) in iter {
            fields.insert(field, value);
        }
        fields
    }
}

/// Fetches a student's current rating for one subject.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingSource: Send + Sync {
    async fn fetch(
        &self,
        subject: &Subject,
        student_id: &StudentId,
    ) -> Result<RatingFields, RatingError>;
}
