//! Cross-crate helpers: logging bootstrap and small shared response types.

pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
        assert_eq!(serde_json::to_value(&h).unwrap()["status"], "ok");
    }
}
