pub mod network_summary;
