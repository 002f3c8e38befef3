// Macros file - tracing macros are imported within the macro definitions

/// Standardized logging macros for consistent field names and message patterns across the application
///
/// These macros ensure:
/// - Consistent field naming conventions
/// - Appropriate logging levels for different scenarios
/// - Structured logging with context

// ============================================================================
// API Operation Logging Macros
// ============================================================================

/// Log the start of an API operation with consistent fields
#[macro_export]
macro_rules! log_api_start {
    ($operation:expr, session_id = $session_id:expr) => {
        tracing::debug!(
            operation = $operation,
            session_id = %$session_id,
            "API operation started"
        );
    };
    ($operation:expr) => {
        tracing::debug!(
            operation = $operation,
            "API operation started"
        );
    };
}

/// Log successful completion of an API operation
#[macro_export]
macro_rules! log_api_success {
    ($operation:expr, session_id = $session_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            session_id = %$session_id,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, days = $days:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            days = $days,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            "API operation completed: {}", $msg
        );
    };
}

/// Log API operation errors with consistent structure
#[macro_export]
macro_rules! log_api_error {
    ($operation:expr, session_id = $session_id:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            session_id = %$session_id,
            error = %$error,
            "API operation failed: {}", $msg
        );
    };
    ($operation:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            error = %$error,
            "API operation failed: {}", $msg
        );
    };
}

/// Log API warnings with context
#[macro_export]
macro_rules! log_api_warn {
    ($operation:expr, session_id = $session_id:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            session_id = %$session_id,
            "API operation warning: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            "API operation warning: {}", $msg
        );
    };
}

// ============================================================================
// LLM Logging Macros
// ============================================================================

/// Log plan generation with provider context
#[macro_export]
macro_rules! log_llm_operation {
    (start, $operation:expr, provider = $provider:expr, days = $days:expr, content_chars = $chars:expr) => {
        tracing::info!(
            component = "plan_client",
            operation = $operation,
            provider = %$provider,
            days = $days,
            content_chars = $chars,
            "LLM operation started"
        );
    };
    (success, $operation:expr, provider = $provider:expr, duration_ms = $duration:expr, days = $days:expr) => {
        tracing::info!(
            component = "plan_client",
            operation = $operation,
            provider = %$provider,
            duration_ms = $duration,
            days = $days,
            "LLM operation completed successfully"
        );
    };
    (error, $operation:expr, provider = $provider:expr, kind = $kind:expr, error = $error:expr) => {
        tracing::error!(
            component = "plan_client",
            operation = $operation,
            provider = %$provider,
            failure_kind = $kind,
            error = %$error,
            "LLM operation failed"
        );
    };
    (warn, $operation:expr, $msg:expr) => {
        tracing::warn!(
            component = "plan_client",
            operation = $operation,
            "LLM operation warning: {}", $msg
        );
    };
}

// ============================================================================
// Session State Logging Macros
// ============================================================================

/// Log a generation state change for a session
#[macro_export]
macro_rules! log_state_transition {
    (discarded, $session_id:expr, attempt = $attempt:expr, $reason:expr) => {
        tracing::debug!(
            component = "session_service",
            session_id = %$session_id,
            attempt = $attempt,
            "Generation outcome discarded: {}", $reason
        );
    };
    ($session_id:expr, from = $from:expr, to = $to:expr, attempt = $attempt:expr) => {
        tracing::info!(
            component = "session_service",
            session_id = %$session_id,
            from = $from,
            to = $to,
            attempt = $attempt,
            "Generation state changed"
        );
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

/// Log system startup and shutdown events
#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (shutdown, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "shutdown",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

// ============================================================================
// Validation Logging Macros
// ============================================================================

/// Log validation results consistently
#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}
