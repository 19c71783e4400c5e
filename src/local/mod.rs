pub mod process_file;
