pub mod chunk_joiner;
pub mod command_runner;
pub mod datanode_service;
pub mod file_chunker;
pub mod namenode_service;
