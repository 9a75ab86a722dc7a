//! Shared building blocks for the home picks workspace: logging setup and
//! the small response envelopes every binary and crate agrees on.

pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health::healthy("Seattle Home Picks API", "1.0.0");
        assert_eq!(h.status, "healthy");
        assert_eq!(h.version, "1.0.0");
    }

    #[test]
    fn status_message_serializes_flag_and_text() {
        let body = serde_json::to_value(types::StatusMessage::failure("Endpoint not found")).unwrap();
        assert_eq!(body, serde_json::json!({"success": false, "message": "Endpoint not found"}));
    }
}
