mod compatibility_test;
mod merge_test;
mod metrics_test;
mod workers_test;
