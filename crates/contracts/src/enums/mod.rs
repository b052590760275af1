pub mod import_mode;
