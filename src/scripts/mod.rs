pub mod index_books;
