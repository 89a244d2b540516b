//! Configuration access port trait.

/// Typed access to configuration values. Getters return `None` for absent
/// keys so validators can tell missing from defaulted; the `_or` variants
/// fold in a default for call sites that do not care.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_f64(&self, section: &str, key: &str) -> Option<f64>;
    fn get_i64(&self, section: &str, key: &str) -> Option<i64>;
    fn get_bool(&self, section: &str, key: &str) -> Option<bool>;

    fn get_string_or(&self, section: &str, key: &str, default: &str) -> String {
        self.get_string(section, key)
            .unwrap_or_else(|| default.to_string())
    }

    fn get_f64_or(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_f64(section, key).unwrap_or(default)
    }

    fn get_i64_or(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_i64(section, key).unwrap_or(default)
    }

    fn get_bool_or(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_bool(section, key).unwrap_or(default)
    }
}
