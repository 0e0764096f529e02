//! Fixed value lists offered for institution type and status.

pub const INSTITUTION_TYPES: [&str; 5] = ["Школа", "Гимназия", "Лицей", "Колледж", "Университет"];

pub const STATUS_TYPES: [&str; 3] = ["Активно", "Закрыто", "На реконструкции"];

pub fn institution_types() -> Vec<String> {
    INSTITUTION_TYPES.iter().map(|s| s.to_string()).collect()
}

pub fn status_types() -> Vec<String> {
    STATUS_TYPES.iter().map(|s| s.to_string()).collect()
}
