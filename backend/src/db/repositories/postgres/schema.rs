// Mirrors the externally managed `readers` table. `books_in_use` is only
// touched through a raw bound statement during the cascading delete.

diesel::table! {
    readers (reader_num) {
        reader_num -> Int4,
        reader_name -> Text,
        reader_adress -> Nullable<Text>,
        reader_phone -> Text,
    }
}
