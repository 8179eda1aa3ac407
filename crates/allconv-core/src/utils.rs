/// Replaces the extension of `name` with `format`.
///
/// Only the last extension is replaced (`archive.tar.gz` -> `archive.tar.png`). A trailing
/// dot counts as an empty extension and is replaced too. A name without an extension gets
/// one appended.
pub fn derive_output_name(name: &str, format: &str) -> String {
    let format = format.trim_start_matches('.');
    match name.rfind('.') {
        Some(idx) if !name[idx + 1..].contains('/') => {
            format!("{}.{}", &name[..idx], format)
        }
        _ => format!("{}.{}", name, format),
    }
}

/// Human readable size with a 1024 base, e.g. `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
