pub mod client_handler;
pub mod config;
pub mod datanode_server;
pub mod namenode_service;
pub mod state_maintainer;
