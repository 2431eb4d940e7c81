pub mod cap_file;
