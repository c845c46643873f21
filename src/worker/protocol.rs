//! HTTP contract of the worker surface. The request body is a
//! [`TaskSpec`](crate::task::TaskSpec); the response is the standard
//! envelope carrying only the admission result, since task completion
//! arrives at the master asynchronously as a report.

// Endpoints
pub const ENDPOINT_TASK_NEW: &str = "/task/new";
