pub mod gap_analysis;
