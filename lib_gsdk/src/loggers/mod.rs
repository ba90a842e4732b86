/// Writes SDK and host log lines to the GSDK output file.
pub mod gsdk_log;
