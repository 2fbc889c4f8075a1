// ABOUTME: Filter module - the operator filter a token registry consults
// ABOUTME: before any custody change or approval-consuming transfer.

mod operator_filter;

pub use operator_filter::*;
