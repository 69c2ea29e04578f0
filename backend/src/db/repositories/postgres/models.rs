use diesel::prelude::*;

use super::schema::readers;
use crate::models::{Reader, ReaderId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = readers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReaderRow {
    pub reader_num: i32,
    pub reader_name: String,
    pub reader_adress: Option<String>,
    pub reader_phone: String,
}

impl From<ReaderRow> for Reader {
    fn from(row: ReaderRow) -> Self {
        Reader {
            id: ReaderId(row.reader_num),
            name: row.reader_name,
            address: row.reader_adress,
            phone: row.reader_phone,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = readers)]
pub struct NewReaderRow {
    pub reader_name: String,
    pub reader_adress: Option<String>,
    pub reader_phone: String,
}

impl From<&Reader> for NewReaderRow {
    fn from(reader: &Reader) -> Self {
        NewReaderRow {
            reader_name: reader.name.clone(),
            reader_adress: reader.address.clone(),
            reader_phone: reader.phone.clone(),
        }
    }
}

/// Full replacement of the mutable columns; a missing address clears the
/// stored one instead of leaving it untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = readers)]
#[diesel(treat_none_as_null = true)]
pub struct ReaderChangeset {
    pub reader_name: String,
    pub reader_adress: Option<String>,
    pub reader_phone: String,
}

impl From<&Reader> for ReaderChangeset {
    fn from(reader: &Reader) -> Self {
        ReaderChangeset {
            reader_name: reader.name.clone(),
            reader_adress: reader.address.clone(),
            reader_phone: reader.phone.clone(),
        }
    }
}
