//! Convenience macros.

/// Log an event with the given `LogLevel`, targeted at the calling module.
///
/// Extra `key => value` pairs are appended as `key=value` metadata.
///
/// # Examples
///
/// ```
/// use bookshop_core::log_event;
/// use bookshop_core::utils::LogLevel;
///
/// log_event!(LogLevel::Info, "order processed");
///
/// log_event!(LogLevel::Debug, "vehicle acquired",
///     license => 101,
///     waited_ms => 12,
/// );
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:expr, $message:expr) => {
        log::log!(
            target: module_path!(),
            $crate::utils::LogLevel::to_level(&$level),
            "{}",
            $message
        )
    };

    ($level:expr, $message:expr, $($key:ident => $value:expr),+ $(,)?) => {
        {
            let metadata = [$(format!("{}={}", stringify!($key), $value)),+].join(" ");
            log::log!(
                target: module_path!(),
                $crate::utils::LogLevel::to_level(&$level),
                "{}: {}",
                $message,
                metadata
            )
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::utils::LogLevel;

    #[test]
    fn test_log_event_expands() {
        log_event!(LogLevel::Trace, "no metadata");
        log_event!(LogLevel::Warning, "with metadata", title => "Dune", left => 0);
    }
}
