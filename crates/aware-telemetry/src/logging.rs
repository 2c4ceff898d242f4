//! Structured logging helpers.
//!
//! Each macro attaches the standard field for its entity so log pipelines
//! can filter on `transaction_id`, `session_id` or `ndp_id` uniformly.

/// Log a transaction-related event with standard fields.
///
/// ```rust,ignore
/// log_txn_event!(info, "transaction completed", txn, kind = "publish");
/// ```
#[macro_export]
macro_rules! log_txn_event {
    ($level:ident, $msg:expr, $transaction_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            transaction_id = %$transaction_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a discovery-session event with standard fields.
#[macro_export]
macro_rules! log_session_event {
    ($level:ident, $msg:expr, $session_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            session_id = %$session_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a data-path event with standard fields.
#[macro_export]
macro_rules! log_ndp_event {
    ($level:ident, $msg:expr, $ndp_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            ndp_id = %$ndp_id,
            $($($field)*,)?
            $msg
        )
    };
}
