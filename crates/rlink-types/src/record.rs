//! The standardized record shape the engine operates on.
//!
//! A [`Record`] never stores an empty string as a present value: construction
//! normalizes `""` to `None` so blockers and comparers never have to special
//! case it downstream.

/// A single logical field value. Dates are kept as their components rather
/// than a formatted string so the date comparer can reason about swapped
/// month/day without reparsing.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(Box<str>),
    Num(f64),
    Date { year: i32, month: u32, day: u32 },
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<(i32, u32, u32)> {
        match self {
            Self::Date { year, month, day } => Some((*year, *month, *day)),
            _ => None,
        }
    }
}

/// One standardized person record. Fields are addressed by dense index
/// (see [`crate::schema::ColumnMap`]), not by name, so the hot comparer path
/// never hashes a string.
#[derive(Debug, Clone)]
pub struct Record {
    pub indv_id: Box<str>,
    fields: Vec<Option<FieldValue>>,
}

impl Record {
    pub fn from_fields(indv_id: impl Into<Box<str>>, fields: Vec<Option<FieldValue>>) -> Self {
        let fields = fields
            .into_iter()
            .map(|field| match field {
                Some(FieldValue::Str(s)) if s.is_empty() => None,
                other => other,
            })
            .collect();
        Self {
            indv_id: indv_id.into(),
            fields,
        }
    }

    pub fn get(&self, idx: u32) -> Option<&FieldValue> {
        self.fields.get(idx as usize).and_then(Option::as_ref)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// An immutable, shareable table of standardized records plus the
/// name-to-index mapping used to resolve config-supplied field names.
#[derive(Debug, Clone)]
pub struct RecordTable {
    pub rows: Vec<Record>,
    pub columns: crate::schema::ColumnMap,
}

impl RecordTable {
    pub fn new(rows: Vec<Record>, columns: crate::schema::ColumnMap) -> Self {
        Self { rows, columns }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn field(&self, row_idx: u32, name: &str) -> Option<&FieldValue> {
        let col_idx = self.columns.index_of(name)?;
        self.rows.get(row_idx as usize)?.get(col_idx)
    }
}
